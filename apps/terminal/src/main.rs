//! # Till Terminal Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr)
//! 2. Load configuration (`--config <path>` or the platform config dir)
//! 3. Connect to the database and run migrations
//! 4. Read commands from stdin until `quit` or EOF
//!
//! ## Usage
//! ```bash
//! till-terminal --config ./till.toml
//! echo "scan 8964000123456" | TILL_DB_PATH=./till_dev.db till-terminal
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use till_db::Database;
use till_terminal::{init_tracing, CheckoutSession, Command, Reply, TerminalConfig, TerminalError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(code = ?err.code, "{}", err.message);
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), TerminalError> {
    let config_path = config_path_arg()?;
    let config = TerminalConfig::load(config_path.as_deref())?;

    let db = Database::new(config.db_config()?).await?;
    info!(
        store = %config.store.name,
        operator = %config.store.operator,
        tax_rate_bps = config.pricing.tax_rate_bps,
        "Terminal ready"
    );

    let mut session = CheckoutSession::new(db.clone(), config);
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "Failed to read stdin");
                break;
            }
        };

        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let result = match line.parse::<Command>() {
            Ok(command) => session.execute(command).await,
            Err(err) => Err(err),
        };

        let quit = matches!(result, Ok(Reply::Bye));
        let json = match &result {
            Ok(reply) => serde_json::to_string(reply),
            Err(err) => serde_json::to_string(&ErrorReply { error: err }),
        };

        match json {
            Ok(json) => {
                if let Err(e) = write_line(&mut stdout, &json).await {
                    error!(error = %e, "Failed to write reply");
                    break;
                }
            }
            Err(e) => error!(error = %e, "Failed to encode reply"),
        }

        if quit {
            break;
        }
    }

    if !session.order().is_empty() {
        info!(lines = session.order().line_count(), "Exiting with an open order, discarded");
    }

    db.close().await;
    Ok(())
}

#[derive(Serialize)]
struct ErrorReply<'a> {
    error: &'a TerminalError,
}

async fn write_line(stdout: &mut io::Stdout, line: &str) -> std::io::Result<()> {
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

fn config_path_arg() -> Result<Option<PathBuf>, TerminalError> {
    let mut args = std::env::args().skip(1);
    let mut path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let value = args
                    .next()
                    .ok_or_else(|| TerminalError::validation("--config needs a path"))?;
                path = Some(PathBuf::from(value));
            }
            other => {
                return Err(TerminalError::validation(format!(
                    "Unknown argument '{}'",
                    other
                )))
            }
        }
    }

    Ok(path)
}
