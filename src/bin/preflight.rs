// file: src/bin/preflight.rs
// description: standalone preflight check, prints MODEL WORKING or exits non-zero

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use tracing::info;
use workshop_agent::preflight::{self, SUCCESS_MARKER};
use workshop_agent::utils::logging::{format_error, format_info, init_logger};
use workshop_agent::{AgentError, AppContext, DotenvPrecedence};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logger(std::io::stderr().is_terminal(), false);

    match run().await {
        Ok(()) => {
            println!("{}", SUCCESS_MARKER);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", format_error(&format!("{:#}", e)));
            if let Some(hint) = AgentError::hint_in(&e) {
                eprintln!("{}", format_info(hint));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let ctx = AppContext::bootstrap(None, Some(Path::new(".env")), DotenvPrecedence::Shell)
        .context("Failed to load configuration")?;
    let chat = ctx.chat_model().await?;
    let report = preflight::check(&chat).await.context("Preflight failed")?;

    info!(
        "{} answered in {:.2}s",
        report.model,
        report.elapsed.as_secs_f64()
    );
    Ok(())
}
