mod cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("smartaid=info")),
        )
        .with_target(false)
        .compact()
        .init();

    match cli::run() {
        cli::RunOutcome::Serve(config) => {
            if let Err(err) = smartaid::serve(config).await {
                tracing::error!(%err, "server stopped");
                std::process::exit(1);
            }
        }
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    }
}
