//! Demonstration of the writing-integrity composition pipeline.
//!
//! This example shows how to:
//! 1. Create a composition controller with a manual clock
//! 2. Feed editor events through it (typing, a paste attempt, a fast burst)
//! 3. Finalize the session into a scored submission
//! 4. Render the moderation review card
//!
//! Run with: cargo run --example compose_demo

use chrono::Duration;
use std::sync::Arc;
use writing_integrity_agent::clock::ManualClock;
use writing_integrity_agent::events::{EditorEvent, KeyClass};
use writing_integrity_agent::moderation::ReviewCard;
use writing_integrity_agent::session::{
    Category, ChapterFields, CompositionController, SubmissionPolicy, SubmissionTarget,
};
use writing_integrity_agent::COLLECTION_NOTICE;

fn main() {
    println!("Writing Integrity Agent - Composition Demo");
    println!("==========================================");
    println!("{COLLECTION_NOTICE}");

    let start = "2025-03-01T12:00:00Z".parse().expect("valid timestamp");
    let clock = Arc::new(ManualClock::new(start));
    let mut controller =
        CompositionController::new(clock.clone(), SubmissionPolicy::default());

    // A writer types a short scene at a human pace.
    let text = "The stranger tied his horse outside the saloon. Nobody spoke. \
                The barkeep kept polishing the same glass long after it shone.";
    let mut typed = String::new();
    for c in text.chars() {
        clock.advance(Duration::milliseconds(350));
        controller.apply(EditorEvent::KeyDown {
            key: KeyClass::Other,
        });
        typed.push(c);
        controller.apply(EditorEvent::Edit { text: typed.clone() });
        controller.poll();
    }
    println!(
        "Typed {} characters, {} sentences",
        controller.content().chars().count(),
        controller.sentence_count()
    );

    // They try to paste a block of text. Blocked, but counted.
    let paste = controller.apply(EditorEvent::Paste { char_count: 800 });
    if let Some(warning) = paste.warning() {
        println!("Paste attempt: {warning}");
    }

    // A script injects characters at machine speed. The guard trips.
    let mut burst = typed.clone();
    for _ in 0..3 {
        clock.advance(Duration::milliseconds(25));
        burst.push('x');
        let outcome = controller.apply(EditorEvent::Edit { text: burst.clone() });
        if let Some(warning) = outcome.warning() {
            println!("Fast typing: {warning}");
        }
    }

    // Let the cooldown pass and some composition time accumulate.
    clock.advance(Duration::seconds(90));
    controller.poll();

    let submission = controller
        .submit(
            SubmissionTarget::NewStory {
                title: "Dust".to_string(),
                summary: "A town holds its breath.".to_string(),
                category: Category::Ugly,
                thumbnail_url: None,
            },
            ChapterFields {
                title: "The Rumor".to_string(),
                summary: "Word travels fast.".to_string(),
            },
        )
        .expect("valid submission");
    controller.submission_succeeded();

    println!();
    let metrics = submission.writing_metadata.expect("metrics attached");
    println!("{}", ReviewCard::from_metadata(&metrics).render_text());
}
