use anyhow::Result;
use clap::Parser;

use concertdb::cli::Cli;
use concertdb::utils::error::{AppError, report_error};
use concertdb::utils::logging::{LoggingConfig, init_logging};
use concertdb::utils::output::OutputStyle;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        match err.downcast_ref::<AppError>() {
            Some(app_err) => report_error(app_err),
            None => eprintln!("❌ {}", OutputStyle::error(&format!("{:#}", err))),
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LoggingConfig { debug: cli.debug })?;

    cli.run().await
}
