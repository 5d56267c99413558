use anyhow::{Context, Result};
use assist_core::collaborator::{DocumentExtractor, ResponseGenerator};
use assist_service::app::ConsoleApp;
use assist_service::config::{Config, ResponseProvider};
use assist_service::document::DocumentRouter;
use assist_service::gemini::GeminiResponder;
use assist_service::mathpix::MathpixExtractor;
use assist_service::offline::OfflineResponder;
use assist_service::repl::{ConsoleCommand, HELP, ParseError};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Ask questions about a document, tailored to how you learn")]
struct Cli {
    /// A plain-text document to answer from
    #[arg(long)]
    document: Option<PathBuf>,
    /// A learning profile to select at startup (repeatable)
    #[arg(long = "profile")]
    profiles: Vec<String>,
    /// Run without the dictation control
    #[arg(long)]
    no_dictation: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    // Logs go to stderr so they do not interleave with the spoken text.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Configuration loaded successfully. Starting assistant...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 4. Initialize the Response Provider ---
    let generator: Box<dyn ResponseGenerator + Send + Sync> = match config.provider {
        ResponseProvider::Gemini => {
            let api_key = config
                .gemini_api_key
                .context("GEMINI_API_KEY is required for the gemini provider")?;
            tracing::info!("Using Gemini model {}", config.gemini_model);
            Box::new(GeminiResponder::new(
                api_key,
                config.gemini_model,
                config.gemini_base_url,
            ))
        }
        ResponseProvider::Offline => {
            tracing::info!("Using the offline responder");
            Box::new(OfflineResponder)
        }
    };

    // --- 5. Initialize Document Extraction ---
    let ocr: Option<Box<dyn DocumentExtractor + Send + Sync>> = match config.mathpix {
        Some((app_id, app_key)) => {
            tracing::info!("Scanned documents will be read with Mathpix OCR");
            Some(Box::new(MathpixExtractor::new(app_id, app_key, config.mathpix_url)))
        }
        None => None,
    };
    let extractor = DocumentRouter::new(ocr);

    // --- 6. Application Setup ---
    // Both speech resources report through this channel; the loop below routes
    // each event to the controller that owns the resource.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut app = ConsoleApp::new(generator, event_tx, !args.no_dictation);
    app.playback_mut().set_rate(config.speech_rate);

    for profile in &args.profiles {
        app.toggle_profile(profile);
    }
    if let Some(path) = &args.document {
        if let Err(e) = app.attach(&extractor, path).await {
            tracing::error!("Could not attach {}: {:#}", path.display(), e);
            println!("Could not use {}: {:#}", path.display(), e);
        }
    }

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // --- 7. Event Loop ---
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("Failed to read from stdin: {}", e);
                        break;
                    }
                };
                match line.parse::<ConsoleCommand>() {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => app.handle(command).await,
                    Err(ParseError::Empty) => {}
                    Err(e) => println!("{e}"),
                }
            }
            Some(event) = event_rx.recv() => app.on_event(event),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down...");
                break;
            }
        }
    }

    // Tears down dictation and playback before the runtime goes away.
    drop(app);
    tracing::info!("Shutting down...");
    Ok(())
}
