use clap::Parser;
use intent_mail::utils::error::{ErrorSeverity, MailError};
use intent_mail::utils::{logger, validation::Validate};
use intent_mail::{CliConfig, Dispatcher, RequestPipeline};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting intent-mail");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    let pipeline = match build_pipeline(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => fail(e),
    };

    tracing::info!(
        "🤖 Model {} at {}",
        config.generator.model,
        config.generator.endpoint
    );

    match pipeline.run(BufReader::new(tokio::io::stdin())).await {
        Ok(summary) => {
            println!(
                "👋 Bye! {} request(s): {} done, {} rejected",
                summary.processed, summary.dispatched, summary.rejected
            );
        }
        Err(e) => fail(e),
    }

    Ok(())
}

fn build_pipeline(config: &intent_mail::AppConfig) -> intent_mail::Result<RequestPipeline> {
    let contacts = config.contact_store()?.into_shared();
    let dispatcher = Dispatcher::new(contacts, config.mail_sender()?);
    Ok(RequestPipeline::new(
        config.text_generator()?,
        dispatcher,
        config.pipeline_options(),
    ))
}

fn fail(e: MailError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
