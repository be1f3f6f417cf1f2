//! Evaluation harness binary
//!
//! Run with: cargo run -p policy-rag --features cli --bin policy-rag-eval -- cases.jsonl

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use policy_rag::{
    chat::ChatEngine,
    config::RagConfig,
    evaluation::{load_cases, write_report, Evaluator},
    index::{IndexBuilder, SharedIndex},
    providers,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Score the chatbot against expected answers
#[derive(Debug, Parser)]
#[command(name = "policy-rag-eval", version)]
struct Args {
    /// JSONL file of {"Query": ..., "truth": ...} cases
    cases: PathBuf,

    /// CSV report destination
    #[arg(short, long, default_value = "policy_eval_results.csv")]
    report: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the model-based judgment
    #[arg(long)]
    no_judge: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "policy_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = RagConfig::load(args.config.as_deref())?;
    let cases = load_cases(&args.cases)?;

    let (embedder, llm) = providers::from_config(&config)?;
    let builder = IndexBuilder::from_config(&config, Arc::clone(&embedder));
    let index = SharedIndex::new().get_or_init(&builder).await?;

    let engine = Arc::new(ChatEngine::from_config(&config, index, embedder, Arc::clone(&llm)));
    let mut evaluator = Evaluator::new(engine);
    if !args.no_judge {
        evaluator = evaluator.with_judge(llm);
    }

    println!("\n--- Starting policy chatbot evaluation ({} cases) ---", cases.len());

    let (records, summary) = evaluator.run(&cases).await;

    for record in &records {
        let status = match (&record.error, record.exact_match) {
            (Some(_), _) => "FAILED",
            (None, true) => "PASSED",
            (None, false) => "PARTIAL",
        };
        println!(
            "\n{}: {}\nROUGE-L: {:.2}%\nLLM Judge: {}\nSources: {}",
            status,
            record.question,
            record.rouge_l_f1 * 100.0,
            record
                .judge_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record.sources
        );
    }

    write_report(&args.report, &records)?;

    println!("\n--- Evaluation complete ---");
    println!(
        "Total: {}, Exact matches: {}, Partial/needs review: {}, Failed: {}",
        summary.total,
        summary.exact_matches,
        summary.total - summary.exact_matches,
        summary.failed
    );
    println!("Exact match accuracy: {:.2}%", summary.exact_match_accuracy() * 100.0);
    println!("Mean ROUGE-L F1: {:.3}", summary.mean_rouge_l);
    if let Some(judge) = summary.mean_judge_score {
        println!("Mean judge score: {:.2}", judge);
    }
    println!("\nDetailed results saved to: {}", args.report.display());

    Ok(())
}
