use simpleq_cli::run_cli;
use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        // Logging may not be up yet, so report on stderr as well
        error!("CLI error: {}", e);
        eprintln!("simpleq: {}", e);

        std::process::exit(e.exit_code());
    }
}
