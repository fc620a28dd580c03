use advisor_cli::{Cli, commands};
use advisor_model::CancellationToken;
use clap::Parser;

#[tokio::main]
async fn main() {
    // `.env` is optional.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = advisor_telemetry::init_telemetry("advisor") {
        eprintln!("warning: logging disabled: {e}");
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    if let Err(e) = commands::run(cli.command, cancel).await {
        tracing::error!(error = %format!("{e:#}"), "command failed");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
