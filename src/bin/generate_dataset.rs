use anyhow::Context;
use clap::Parser;
use intent_mail::core::dataset::{write_jsonl_file, DatasetGenerator};
use intent_mail::utils::logger;

#[derive(Parser)]
#[command(name = "generate_dataset")]
#[command(about = "Generate a synthetic instruction/output JSONL dataset for adapter fine-tuning")]
struct Args {
    /// Number of examples to generate
    #[arg(short = 'n', long, default_value = "1000")]
    count: usize,

    /// Output JSONL path
    #[arg(short, long, default_value = "dataset.jsonl")]
    output: String,

    /// Seed for reproducible datasets
    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let examples = match args.seed {
        Some(seed) => DatasetGenerator::seeded(seed).generate(args.count),
        None => DatasetGenerator::from_entropy().generate(args.count),
    }
    .context("generating examples")?;

    write_jsonl_file(&args.output, &examples)
        .with_context(|| format!("writing {}", args.output))?;

    tracing::info!("✅ Generated {} with {} examples", args.output, examples.len());
    println!("✅ Generated {} with {} examples", args.output, examples.len());
    Ok(())
}
