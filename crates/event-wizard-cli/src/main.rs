use anyhow::{Context, Result};
use event_wizard::{init_logging, TerminalShell, WizardConfig};
use event_wizard_core::{event_steps, Wizard};
use event_wizard_http::HttpEventApi;
use std::io;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment variables
    let config = WizardConfig::load().context("Failed to load configuration")?;

    init_logging(&config.log_level, config.log_format).context("Failed to initialize logging")?;

    let api = HttpEventApi::with_timeout(&config.api_url, config.http_timeout())
        .context("Failed to create event API client")?
        .with_presign_path(config.presign_path.clone())
        .with_create_path(config.create_path.clone());

    let wizard = Arc::new(
        Wizard::new(event_steps(), Arc::new(api), config.owner_id.clone())
            .context("Failed to create wizard")?
            .with_defaults(config.defaults.clone())
            .with_initial_values(config.initial_values()),
    );

    // Ctrl-C cancels an in-flight submission, otherwise leaves
    let signal_wizard = wizard.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !signal_wizard.cancel_submission() {
                std::process::exit(130);
            }
            info!("Submission cancellation requested");
        }
    });

    let stdin = io::stdin();
    let mut shell = TerminalShell::new(stdin.lock(), io::stdout());

    match wizard.run(&mut shell).await.context("Wizard error")? {
        Some(receipt) => {
            println!("Événement créé avec succès !");
            println!("Visuel: {}", receipt.asset_url);
            if !receipt.response.is_null() {
                println!("{}", receipt.response);
            }
        }
        None => info!("Wizard closed without submitting"),
    }

    Ok(())
}
