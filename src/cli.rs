use clap::{Args, Parser, Subcommand};
use smartaid::config::{AppConfig, DEFAULT_BIND};
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use tracing::error;

pub(crate) enum RunOutcome {
    Serve(AppConfig),
    Exit(i32),
}

#[derive(Debug, Error)]
enum ConfigError {
    #[error("invalid bind address '{0}'; expected <ip>:<port>")]
    InvalidBind(String),
    #[error("store path cannot be empty")]
    EmptyStorePath,
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::Init(args)) = cli.command {
        let code = run_init(args);
        return RunOutcome::Exit(code);
    }

    match resolve_config(cli) {
        Ok(config) => RunOutcome::Serve(config),
        Err(err) => {
            error!(%err, "invalid configuration");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "smartaid",
    version,
    about = "Medication reminder push notification server"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, default_value = "SmartAid")]
    app_name: String,
    #[arg(long, env = "SMARTAID_BIND", default_value = DEFAULT_BIND)]
    bind: String,
    #[arg(long, env = "SMARTAID_STORE_PATH")]
    store_path: Option<PathBuf>,
    #[arg(long, env = "SMARTAID_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "SMARTAID_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "SMARTAID_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a VAPID key pair for push notifications.
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match smartaid::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            error!(%err, "failed to generate VAPID credentials");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => ("mailto:you@example.com".to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("SMARTAID_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("SMARTAID_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("SMARTAID_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace SMARTAID_VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

fn resolve_config(cli: Cli) -> Result<AppConfig, ConfigError> {
    let bind = cli.bind.trim();
    let bind: SocketAddr = bind
        .parse()
        .map_err(|_| ConfigError::InvalidBind(bind.to_string()))?;

    if let Some(path) = cli.store_path.as_ref()
        && path.as_os_str().is_empty()
    {
        return Err(ConfigError::EmptyStorePath);
    }

    Ok(AppConfig {
        app_name: cli.app_name,
        bind,
        store_path: cli.store_path,
        vapid_private_key: cli.vapid_private_key,
        vapid_public_key: cli.vapid_public_key,
        vapid_subject: cli.vapid_subject,
    })
}
