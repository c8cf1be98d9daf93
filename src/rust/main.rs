use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use log::{info, warn};
use sentiment_session::session::{DEFAULT_MODEL, MODEL_ENV};
use sentiment_session::{CancellationToken, ClassifierSession, OnnxProvider, SessionError};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Texts to classify; reads one text per stdin line when omitted
    texts: Vec<String>,

    /// Hub identifier of the model to load
    #[arg(short, long, env = MODEL_ENV, default_value = DEFAULT_MODEL)]
    model: String,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    fresh: bool,

    /// Never download; fail unless the model is already cached
    #[arg(long, conflicts_with = "fresh")]
    offline: bool,

    /// Print each result as a JSON object
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let provider = OnnxProvider::new_default()?.offline(args.offline);
    info!("Using model cache {}", provider.manager().models_dir().display());
    if args.fresh {
        let info = OnnxProvider::resolve(&args.model)?;
        info!("Fresh download requested - removing any existing files for '{}'", info.name);
        provider.manager().remove_download(&info.name)?;
    }

    let session = ClassifierSession::builder()
        .with_provider(Arc::new(provider))
        .with_model(args.model.as_str())
        .build()?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    info!("=== Starting Sentiment Session Demo ({}) ===", args.model);
    let start_time = Instant::now();

    if !args.texts.is_empty() {
        for text in &args.texts {
            process_input(&session, text, args.json, &cancel).await?;
        }
    } else {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match process_input(&session, &line, args.json, &cancel).await {
                Err(SessionError::Cancelled) => break,
                // Keep reading; the next line retries a failed load
                Err(e) => {
                    eprintln!("Error processing text: {}", e);
                    warn!("Continuing with the next line");
                }
                Ok(()) => {}
            }
        }
    }

    info!("=== Demo Complete (took {:.2?}) ===", start_time.elapsed());
    Ok(())
}

async fn process_input(
    session: &ClassifierSession,
    text: &str,
    json: bool,
    cancel: &CancellationToken,
) -> Result<(), SessionError> {
    let started = Instant::now();
    match session.classify_with_cancel(text, cancel).await {
        Ok(result) => {
            if json {
                match serde_json::to_string(&result) {
                    Ok(line) => println!("{}", line),
                    Err(e) => eprintln!("Failed to serialize result: {}", e),
                }
            } else {
                println!("{}", result);
            }
            info!("Classified in {:.2?}", started.elapsed());
            Ok(())
        }
        Err(e) => {
            // The caller reports the error itself
            if let SessionError::ModelLoad(_) = e {
                eprintln!("Consider:");
                eprintln!("  - Checking your network connection");
                eprintln!("  - Running with --fresh to discard a corrupt download");
            }
            Err(e)
        }
    }
}
