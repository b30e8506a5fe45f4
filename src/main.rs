//! boxrecon CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;

use boxrecon::cli::{AnalyzeArgs, Cli, Commands, ReconcileArgs, RenderArgs, StatsArgs, TransformArgs};
use boxrecon::{
    evaluate_size_consistency, median_dimensions, read_boxa, save_tiled_png, write_boxa,
    BoxReconConfig, BoxaPipeline, ReconcileOptions, Reconciler, TileOptions,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::Stats(args) => run_stats(&args),
        Commands::Reconcile(args) => run_reconcile(&args),
        Commands::Transform(args) => run_transform(&args),
        Commands::Render(args) => run_render(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BoxReconConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BoxReconConfig::load_default().context("loading user config")?,
    };
    if args.render {
        config.render.enabled = true;
    }

    let pipeline = BoxaPipeline::new(config);
    let results = pipeline.run_batch(&args.inputs, args.out_dir.as_deref());

    let mut outcomes = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for (input, result) in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                failures += 1;
                eprintln!("{}: {}", input.display(), e);
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&outcomes)?);

    if failures > 0 {
        anyhow::bail!("{} of {} inputs failed", failures, args.inputs.len());
    }
    Ok(())
}

fn run_stats(args: &StatsArgs) -> Result<()> {
    let boxes = read_boxa(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let medians = median_dimensions(&boxes)?;
    let deviation = evaluate_size_consistency(&boxes, args.mode.into());

    let report = serde_json::json!({
        "input": args.input,
        "count": boxes.len(),
        "valid_count": boxes.valid_count(),
        "medians": medians,
        "deviation": deviation,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_reconcile(args: &ReconcileArgs) -> Result<()> {
    let boxes = read_boxa(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let options = ReconcileOptions {
        check: args.check.into(),
        thresh_factor: args.thresh_factor,
        size_factor: args.size_factor,
    };
    let result = Reconciler::new(options).run(&boxes)?;

    write_boxa(&args.output, &result.boxes)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("{}", serde_json::to_string_pretty(&result.stats)?);
    Ok(())
}

fn run_transform(args: &TransformArgs) -> Result<()> {
    let boxes = read_boxa(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let transformed = boxes.transform(args.dx, args.dy, args.sx, args.sy)?;
    write_boxa(&args.output, &transformed)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}

fn run_render(args: &RenderArgs) -> Result<()> {
    let boxes = read_boxa(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let options = TileOptions {
        max_width: args.max_width,
        scale: args.scale,
        ..Default::default()
    };
    save_tiled_png(&boxes, &options, &args.output)
        .with_context(|| format!("rendering {}", args.output.display()))?;
    Ok(())
}
