/// Command-line front end: generate maps, list presets and the biome catalog.
///
/// Parameters are layered: `--params` file (or defaults), then `--preset`,
/// then individual flags.
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use biomegen_core::classifier::{load_or_train, ModelSource, DEFAULT_MODEL_PATH};
use biomegen_core::{
    BiomeCatalog, ClassifierSlot, DecisionTree, GeneratedMap, GenerationParams, MapGenerator, Preset, TrainingConfig,
};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "biomegen", about = "Procedural terrain and biome map generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one generation and print its summary.
    Generate(GenerateArgs),
    /// List biome presets and their slider amounts.
    Presets,
    /// List the biome catalog.
    Biomes {
        /// Print as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// JSON parameter file; flags below override its values.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Apply a preset's biome amounts (e.g. archipelago, desert).
    #[arg(long)]
    preset: Option<Preset>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Noise scale; larger values give broader features.
    #[arg(long)]
    scale: Option<f64>,

    /// Terrain roughness in [0, 1].
    #[arg(long)]
    roughness: Option<f64>,

    /// Omit to draw a random seed.
    #[arg(long)]
    seed: Option<i64>,

    /// Disable the island falloff.
    #[arg(long)]
    no_island: bool,

    /// Smoothing iterations.
    #[arg(long)]
    smooth: Option<u32>,

    #[arg(long)]
    water: Option<f64>,

    #[arg(long)]
    mountain: Option<f64>,

    #[arg(long)]
    desert: Option<f64>,

    #[arg(long)]
    forest: Option<f64>,

    #[arg(long)]
    temperature: Option<f64>,

    /// Trained decision tree JSON (see the `trainer` tool). Without it the
    /// default model path is used when present.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Train and save a model at the default path when none is found there.
    #[arg(long)]
    auto_train: bool,

    /// Classify with rules only, even when a model is loaded.
    #[arg(long)]
    no_ml: bool,

    /// Print the biome grid as text glyphs.
    #[arg(long)]
    ascii: bool,

    /// Write the full map (all grids and summary) as JSON.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

// ── Parameters ───────────────────────────────────────────────────────────────

fn build_params(args: &GenerateArgs) -> Result<GenerationParams> {
    let mut params = match &args.params {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => GenerationParams::default(),
    };
    if let Some(preset) = args.preset {
        params = params.with_preset(preset);
    }

    if let Some(v) = args.width {
        params.width = v;
    }
    if let Some(v) = args.height {
        params.height = v;
    }
    if let Some(v) = args.scale {
        params.scale = v;
    }
    if let Some(v) = args.roughness {
        params.roughness = v;
    }
    if let Some(v) = args.smooth {
        params.smooth_iterations = v;
    }
    let a = &mut params.amounts;
    for (flag, slot) in [
        (args.water, &mut a.water),
        (args.mountain, &mut a.mountain),
        (args.desert, &mut a.desert),
        (args.forest, &mut a.forest),
        (args.temperature, &mut a.temperature),
    ] {
        if let Some(v) = flag {
            *slot = v;
        }
    }
    if args.seed.is_some() {
        params.seed = args.seed;
    }
    if args.no_island {
        params.island_mode = false;
    }
    if args.no_ml {
        params.use_ml = false;
    }
    Ok(params)
}

// ── Commands ─────────────────────────────────────────────────────────────────

fn generate(args: GenerateArgs) -> Result<()> {
    let params = build_params(&args)?;
    let slot = ClassifierSlot::new();
    install_model(&args, params.use_ml, &slot)?;

    let map = MapGenerator::with_classifier(slot.clone())
        .generate(&params)
        .context("generation failed")?;
    print_summary(&map);

    if let Some(model) = slot.snapshot() {
        let agreement = map.agreement(model.as_ref());
        println!(
            "model/rules agreement: {}/{} ({:.1}%)",
            agreement.correct,
            agreement.total,
            agreement.accuracy * 100.0
        );
    }
    if args.ascii {
        print!("{}", map.to_ascii());
    }
    if let Some(path) = &args.output {
        let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer(&mut out, &map).context("serialising map")?;
        out.flush()?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn load_model(path: &Path, slot: &ClassifierSlot) -> Result<()> {
    let tree = DecisionTree::load(path).with_context(|| format!("loading model {}", path.display()))?;
    info!("loaded model from {}: {} nodes", path.display(), tree.node_count());
    slot.install(Arc::new(tree));
    Ok(())
}

fn install_model(args: &GenerateArgs, use_ml: bool, slot: &ClassifierSlot) -> Result<()> {
    if let Some(path) = &args.model {
        return load_model(path, slot);
    }
    if !use_ml {
        return Ok(());
    }
    let default = Path::new(DEFAULT_MODEL_PATH);
    if args.auto_train {
        let source = load_or_train(default, &TrainingConfig::default(), slot).context("preparing model")?;
        if let ModelSource::Trained(report) = source {
            println!(
                "trained model: test accuracy {:.4}, saved to {DEFAULT_MODEL_PATH}",
                report.test_accuracy
            );
        }
        Ok(())
    } else if default.exists() {
        load_model(default, slot)
    } else {
        info!("no model at {DEFAULT_MODEL_PATH}, classifying with rules (--auto-train trains one)");
        Ok(())
    }
}

fn print_summary(map: &GeneratedMap) {
    let s = &map.summary;
    println!("seed {}  {}x{}  water level {:.3}", map.seed, map.width(), map.height(), map.thresholds.water_level);
    println!(
        "{} cells: {} by classifier ({:.1}%), {} by rules",
        s.total_cells, s.ml_cells, s.ml_percent, s.rule_cells
    );
    for (biome, count) in &s.biome_counts {
        let pct = if s.total_cells > 0 { *count as f64 * 100.0 / s.total_cells as f64 } else { 0.0 };
        println!("  {:<16} {:>7}  {:5.1}%", biome.name(), count, pct);
    }
}

fn list_presets() {
    println!("{:<12} {:>6} {:>9} {:>7} {:>7} {:>12}", "preset", "water", "mountain", "desert", "forest", "temperature");
    for preset in Preset::ALL {
        let a = preset.amounts();
        println!(
            "{:<12} {:>6.2} {:>9.2} {:>7.2} {:>7.2} {:>12.2}",
            preset.name(),
            a.water,
            a.mountain,
            a.desert,
            a.forest,
            a.temperature
        );
    }
}

#[derive(Serialize)]
struct CatalogRow {
    id: u8,
    name: &'static str,
    color: &'static str,
    rgb: [u8; 3],
    glyph: char,
}

fn list_biomes(json: bool) -> Result<()> {
    let rows: Vec<CatalogRow> = BiomeCatalog::entries()
        .iter()
        .map(|e| CatalogRow { id: e.biome.id(), name: e.name, color: e.color, rgb: e.rgb, glyph: e.glyph })
        .collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for r in &rows {
            println!("{:>2}  {}  {:<16} {}", r.id, r.glyph, r.name, r.color);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match Cli::parse().command {
        Command::Generate(args) => generate(args),
        Command::Presets => {
            list_presets();
            Ok(())
        }
        Command::Biomes { json } => list_biomes(json),
    }
}
