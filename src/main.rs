//! Writing Integrity Agent CLI
//!
//! Composition scoring for story submissions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use writing_integrity_agent::{
    audit::create_shared_log_with_persistence,
    config::Config,
    core::{evaluate, WritingMetadata},
    moderation::ReviewCard,
    session::{RecordedSession, SessionReplayer, SubmissionPolicy},
    COLLECTION_NOTICE, VERSION,
};

#[cfg(feature = "submit")]
use writing_integrity_agent::BlockingBackendClient;

#[derive(Parser)]
#[command(name = "writing-integrity")]
#[command(author = "Inkfeed")]
#[command(version = VERSION)]
#[command(about = "Composition scoring for story submissions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a stored metrics record
    Score {
        /// Path to a writing-metadata JSON file
        metrics: PathBuf,
    },

    /// Render the full moderation review card for a metrics record
    Review {
        /// Path to a writing-metadata JSON file
        metrics: PathBuf,
    },

    /// Replay a recorded composition session and score it
    Replay {
        /// Path to a recorded-session JSON file
        session: PathBuf,

        /// Write the replay outcome as JSON to this path
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Submit the scored chapter to the story backend (requires submit feature)
        #[arg(long)]
        submit: bool,

        /// Backend port (auto-detected from runtime dir if not specified)
        #[arg(long)]
        backend_port: Option<u16>,

        /// Backend token (auto-detected from runtime dir if not specified)
        #[arg(long)]
        backend_token: Option<String>,
    },

    /// Run the HTTP scoring server (requires server feature)
    Serve {
        /// Port to bind to (0 for random)
        #[arg(long, default_value = "4810")]
        port: u16,

        /// Forward scored chapters to the story backend
        #[arg(long)]
        forward: bool,

        /// Backend port (auto-detected from runtime dir if not specified)
        #[arg(long)]
        backend_port: Option<u16>,

        /// Backend token (auto-detected from runtime dir if not specified)
        #[arg(long)]
        backend_token: Option<String>,
    },

    /// Show cumulative audit statistics
    Status,

    /// Display collection notice
    Privacy,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Score { metrics } => cmd_score(&metrics),
        Commands::Review { metrics } => cmd_review(&metrics),
        Commands::Replay {
            session,
            output,
            submit,
            backend_port,
            backend_token,
        } => cmd_replay(&session, output, submit, backend_port, backend_token),
        Commands::Serve {
            port,
            forward,
            backend_port,
            backend_token,
        } => cmd_serve(port, forward, backend_port, backend_token),
        Commands::Status => cmd_status(),
        Commands::Privacy => cmd_privacy(),
        Commands::Config => cmd_config(),
    }
}

fn load_metrics(path: &PathBuf) -> WritingMetadata {
    let content = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {path:?}: {e}");
        std::process::exit(1);
    });
    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing metrics record: {e}");
        std::process::exit(1);
    })
}

fn cmd_score(path: &PathBuf) {
    let metrics = load_metrics(path);
    let report = evaluate(&metrics);

    println!("Trust: {} (score {}/10)", report.level, report.score);
    println!(
        "Signals: time {} | paste {} | backspace {} | speed {}",
        report.signals.time, report.signals.paste, report.signals.backspace, report.signals.speed
    );
}

fn cmd_review(path: &PathBuf) {
    let metrics = load_metrics(path);
    let card = ReviewCard::from_metadata(&metrics);
    print!("{}", card.render_text());
}

#[allow(unused_variables)]
fn cmd_replay(
    path: &PathBuf,
    output: Option<PathBuf>,
    submit: bool,
    backend_port: Option<u16>,
    backend_token: Option<String>,
) {
    let content = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {path:?}: {e}");
        std::process::exit(1);
    });
    let session: RecordedSession = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing recorded session: {e}");
        std::process::exit(1);
    });

    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let audit = create_shared_log_with_persistence(config.audit_path());
    let replayer = SessionReplayer::new()
        .with_policy(SubmissionPolicy {
            min_content_chars: config.min_content_chars,
        })
        .with_audit(audit.clone());

    let outcome = match replayer.replay(&session) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Replay failed: {e}");
            std::process::exit(1);
        }
    };

    println!("Session {} replayed ({} events)", session.session_id, session.events.len());
    println!();
    if let Some(metrics) = &outcome.submission.writing_metadata {
        print!("{}", ReviewCard::from_metadata(metrics).render_text());
    }
    println!("  Dropped edits: {}", outcome.dropped_edits);
    println!("  Pastes blocked: {}", outcome.pastes_blocked);
    if let Some(cadence) = &outcome.cadence {
        println!(
            "  Cadence: {:.0}ms mean, {:.0}ms std dev over {} intervals",
            cadence.mean_ms, cadence.std_dev_ms, cadence.samples
        );
    }

    if let Some(output_path) = output {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&output_path, json) {
                    eprintln!("Error writing outcome: {e}");
                } else {
                    println!("Wrote outcome to {output_path:?}");
                }
            }
            Err(e) => eprintln!("Error serializing outcome: {e}"),
        }
    }

    #[cfg(feature = "submit")]
    if submit {
        match create_backend_client(backend_port, backend_token) {
            Ok(client) => match client.submit_chapter(
                &outcome.submission,
                &session.session_id.to_string(),
            ) {
                Ok(response) => println!("Submitted: {response}"),
                Err(e) => {
                    eprintln!("Submission failed: {e}");
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Backend initialization failed: {e}");
                std::process::exit(1);
            }
        }
    }

    #[cfg(not(feature = "submit"))]
    if submit {
        eprintln!("Warning: --submit flag ignored (submit feature not enabled at compile time)");
    }

    if let Err(e) = audit.save() {
        eprintln!("Warning: Could not save audit totals: {e}");
    }
}

#[allow(unused_variables)]
fn cmd_serve(port: u16, forward: bool, backend_port: Option<u16>, backend_token: Option<String>) {
    #[cfg(feature = "server")]
    {
        use writing_integrity_agent::server::{self, ServerConfig};

        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();

        let config = Config::load().unwrap_or_default();
        if let Err(e) = config.ensure_directories() {
            eprintln!("Warning: Could not create directories: {e}");
        }

        let backend = if forward {
            match resolve_backend_config(backend_port, backend_token) {
                Ok(backend) => Some(backend),
                Err(e) => {
                    eprintln!("Error: Backend configuration failed: {e}");
                    std::process::exit(1);
                }
            }
        } else {
            None
        };

        let policy = SubmissionPolicy {
            min_content_chars: config.min_content_chars,
        };
        let audit = create_shared_log_with_persistence(config.audit_path());

        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error creating runtime: {e}");
            std::process::exit(1);
        });

        runtime.block_on(async {
            let server_config = ServerConfig::new(port, policy, backend);
            let (addr, shutdown_tx) = match server::run(server_config, audit.clone()).await {
                Ok(handle) => handle,
                Err(e) => {
                    eprintln!("Error starting server: {e}");
                    std::process::exit(1);
                }
            };

            println!("Writing Integrity Agent v{VERSION}");
            println!("Listening on http://{addr}");
            println!("Press Ctrl+C to stop");

            // Wait for Ctrl+C, then drain through graceful shutdown.
            let (tx, rx) = crossbeam_channel::bounded::<()>(1);
            ctrlc::set_handler(move || {
                let _ = tx.send(());
            })
            .expect("Error setting Ctrl+C handler");

            let _ = tokio::task::spawn_blocking(move || rx.recv()).await;

            println!();
            println!("Shutting down...");
            let _ = shutdown_tx.send(());

            if let Err(e) = audit.save() {
                eprintln!("Warning: Could not save audit totals: {e}");
            }
            println!("{}", audit.summary());
        });
    }

    #[cfg(not(feature = "server"))]
    {
        eprintln!("Error: serve requires the server feature to be enabled at compile time");
        std::process::exit(1);
    }
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Writing Integrity Agent Status");
    println!("==============================");
    println!();
    println!("Configuration:");
    println!("  Minimum chapter length: {} chars", config.min_content_chars);
    println!("  Audit persistence: {}", config.persist_audit);
    println!();

    let stats_path = config.audit_path();
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(keys) = stats.get("keystrokes_observed") {
                    println!("  Keystrokes observed: {keys}");
                }
                if let Some(pastes) = stats.get("pastes_blocked") {
                    println!("  Paste attempts blocked: {pastes}");
                }
                if let Some(cooldowns) = stats.get("cooldowns_triggered") {
                    println!("  Typing cooldowns triggered: {cooldowns}");
                }
                if let Some(sessions) = stats.get("sessions_finalized") {
                    println!("  Sessions finalized: {sessions}");
                }
                if let Some(updated) = stats.get("last_updated") {
                    println!("  Last updated: {updated}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_privacy() {
    println!("{COLLECTION_NOTICE}");
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Create a backend client from CLI args or the runtime directory.
#[cfg(feature = "submit")]
fn create_backend_client(
    port: Option<u16>,
    token: Option<String>,
) -> Result<BlockingBackendClient, writing_integrity_agent::BackendError> {
    let config = resolve_backend_config(port, token)?;
    BlockingBackendClient::new(config)
}

/// Resolve backend configuration from CLI args or the runtime directory.
#[cfg(feature = "submit")]
fn resolve_backend_config(
    port: Option<u16>,
    token: Option<String>,
) -> Result<writing_integrity_agent::BackendConfig, writing_integrity_agent::BackendError> {
    use writing_integrity_agent::BackendConfig;

    if let (Some(p), Some(t)) = (port, token.clone()) {
        return Ok(BackendConfig::new("127.0.0.1", p, t));
    }

    if port.is_some() || token.is_some() {
        eprintln!("Warning: Partial backend config provided, trying runtime directory...");
    }
    BackendConfig::from_runtime_dir()
}
