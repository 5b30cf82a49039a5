/// Trains the biome decision tree on rule-engine labels and writes it as JSON
/// for `biomegen generate --model`.
use std::path::PathBuf;

use anyhow::{Context, Result};
use biomegen_core::classifier::{TreeConfig, DEFAULT_MODEL_PATH, FEATURE_NAMES};
use biomegen_core::{ClassifierSlot, TrainingConfig, TrainingJob};
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(name = "trainer", about = "Train the learned biome classifier")]
struct Args {
    /// Number of labelled samples to draw.
    #[arg(long, default_value = "50000")]
    samples: usize,

    /// Sampling seed.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Share of samples held out for testing.
    #[arg(long, default_value = "0.2")]
    test_fraction: f64,

    #[arg(long, default_value = "15")]
    max_depth: usize,

    /// Output model file.
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    output: PathBuf,

    /// Also print the training report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = TrainingConfig {
        samples: args.samples,
        seed: args.seed,
        test_fraction: args.test_fraction,
        tree: TreeConfig { max_depth: args.max_depth, ..TreeConfig::default() },
    };
    info!("training on {} samples (seed {})", config.samples, config.seed);

    let slot = ClassifierSlot::new();
    let trained = TrainingJob::spawn(slot, config)
        .context("starting training")?
        .join()
        .context("training failed")?;
    let report = &trained.report;

    println!(
        "train accuracy {:.4} ({} samples), test accuracy {:.4} ({} samples)",
        report.train_accuracy, report.train_samples, report.test_accuracy, report.test_samples
    );
    println!("{} nodes, depth {}, {} ms", report.nodes, report.depth, report.elapsed_ms);

    println!("\nfeature importances:");
    let mut ranked: Vec<_> = FEATURE_NAMES.iter().zip(report.feature_importances).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (name, importance) in ranked {
        println!("  {name:<16} {importance:.4}");
    }

    println!("\n{:<16} {:>9} {:>7} {:>8}", "biome", "precision", "recall", "support");
    for c in &report.per_class {
        println!("{:<16} {:>9.3} {:>7.3} {:>8}", c.biome.name(), c.precision, c.recall, c.support);
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    }

    if let Some(dir) = args.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    trained.tree.save(&args.output).with_context(|| format!("writing {}", args.output.display()))?;
    println!("wrote {}", args.output.display());
    Ok(())
}
