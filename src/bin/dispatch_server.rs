use clap::Parser;
use intent_mail::utils::{logger, validation::Validate};
use intent_mail::{server, AppConfig, Dispatcher};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "dispatch_server")]
#[command(about = "HTTP endpoint that dispatches structured email / contact-update intents")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the bind address from config
    #[arg(short, long)]
    bind: Option<String>,

    /// Log outgoing mail instead of sending it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logger::init_server_logger();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if args.dry_run {
        config.mail.dry_run = true;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let contacts = config.contact_store()?.into_shared();
    let dispatcher = Dispatcher::new(contacts, config.mail_sender()?);

    let listener = TcpListener::bind(config.bind_addr()?).await?;
    server::serve(listener, dispatcher).await?;

    Ok(())
}
