//! Command implementations for the ximl CLI.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;

use crate::classify::Classifier;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::codec::{convert_json_lines, partial_convert_json_lines, revert_to_json_lines};
use crate::config::PipelineConfig;
use crate::stats::PredictionStatistics;
use crate::transform::Transformer;

/// Execute a CLI command.
pub fn execute_command(args: XimlArgs) -> Result<()> {
    match &args.command {
        Command::Classify(classify_args) => classify(classify_args, &args),
        Command::Transform(transform_args) => transform(transform_args, &args),
        Command::Stats(stats_args) => stats(stats_args, &args),
        Command::Binarize(binarize_args) => binarize(binarize_args, &args),
        Command::Revert(revert_args) => revert(revert_args, &args),
        Command::Run(run_args) => run_pipeline(run_args, &args),
    }
}

/// Size the global rayon pool. Only the first call has an effect.
fn configure_threads(threads: Option<usize>) -> Result<()> {
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .with_context(|| format!("Failed to start {n} worker threads"))?;
        info!("Using {n} worker threads");
    }
    Ok(())
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Classify a features corpus.
fn classify(args: &ClassifyArgs, cli_args: &XimlArgs) -> Result<()> {
    configure_threads(args.batch.threads)?;
    let classifier = Classifier::load(args.kind, &args.model)
        .with_context(|| format!("Failed to load {} model", args.kind))?;

    let start = Instant::now();
    let summary = classifier
        .store_classification(&args.input, &args.output, &args.batch.options())
        .with_context(|| format!("Failed to classify '{}'", args.input.display()))?;

    output_result(
        "Classification completed",
        &BatchResult::new(&args.input, &args.output, summary, elapsed_ms(start)),
        cli_args,
    )
}

/// Add features to a corpus.
fn transform(args: &TransformArgs, cli_args: &XimlArgs) -> Result<()> {
    configure_threads(args.batch.threads)?;
    let transformer = Transformer::load(args.kind, &args.files())
        .with_context(|| format!("Failed to load {} model", args.kind))?;

    let start = Instant::now();
    let summary = transformer
        .store_transformation(&args.input, &args.output, &args.batch.options())
        .with_context(|| format!("Failed to transform '{}'", args.input.display()))?;

    output_result(
        "Transformation completed",
        &BatchResult::new(&args.input, &args.output, summary, elapsed_ms(start)),
        cli_args,
    )
}

/// Score classified corpora.
fn stats(args: &StatsArgs, cli_args: &XimlArgs) -> Result<()> {
    configure_threads(args.threads)?;
    let statistics = PredictionStatistics::new(&args.inputs, &args.categories);
    let report = match &args.output {
        Some(output) => statistics
            .save(output)
            .with_context(|| format!("Failed to save statistics to '{}'", output.display()))?,
        None => statistics.compute().context("Failed to compute statistics")?,
    };
    output_result("Prediction statistics", &report, cli_args)
}

/// Convert a JSON-lines dump into a binary model.
fn binarize(args: &BinarizeArgs, cli_args: &XimlArgs) -> Result<()> {
    let records = match &args.ids {
        Some(ids) => {
            let ids: HashSet<u32> = ids.iter().copied().collect();
            partial_convert_json_lines(&args.input, &args.output, &ids)
        }
        None => convert_json_lines(&args.input, &args.output),
    }
    .with_context(|| format!("Failed to binarize '{}'", args.input.display()))?;

    output_result(
        "Model converted",
        &conversion_result(&args.input, &args.output, records),
        cli_args,
    )
}

/// Convert a binary model into JSON lines.
fn revert(args: &RevertArgs, cli_args: &XimlArgs) -> Result<()> {
    let records = revert_to_json_lines(&args.input, &args.output)
        .with_context(|| format!("Failed to revert '{}'", args.input.display()))?;

    output_result(
        "Model reverted",
        &conversion_result(&args.input, &args.output, records),
        cli_args,
    )
}

fn conversion_result(input: &Path, output: &Path, records: usize) -> ConversionResult {
    ConversionResult {
        input: input.display().to_string(),
        output: output.display().to_string(),
        records,
    }
}

/// Transform, classify and score a corpus as configured.
fn run_pipeline(args: &RunArgs, cli_args: &XimlArgs) -> Result<()> {
    let config = PipelineConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration '{}'", args.config.display()))?;
    configure_threads(config.threads)?;
    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory '{}'", args.output_dir.display())
    })?;

    let mut features = args.input.clone();
    let transform = match &config.transformer {
        Some(transformer_config) => {
            let transformer = Transformer::load(transformer_config.kind, &transformer_config.files)
                .context("Failed to load transformer")?;
            let output = args.output_dir.join("features.jsonl");
            let start = Instant::now();
            let summary = transformer
                .store_transformation(&args.input, &output, &config.batch)
                .context("Transformation failed")?;
            let result = BatchResult::new(&args.input, &output, summary, elapsed_ms(start));
            features = output;
            Some(result)
        }
        None => None,
    };

    let classifier = Classifier::load(config.classifier.kind, &config.classifier.model)
        .context("Failed to load classifier")?;
    let predictions = args.output_dir.join("predictions.jsonl");
    let start = Instant::now();
    let summary = classifier
        .store_classification(&features, &predictions, &config.batch)
        .context("Classification failed")?;
    let classify = BatchResult::new(&features, &predictions, summary, elapsed_ms(start));

    let stats = if config.categories.is_empty() {
        None
    } else {
        let report = PredictionStatistics::new(&[&predictions], &config.categories)
            .save(&args.output_dir.join("stats.json"))
            .context("Failed to compute statistics")?;
        Some(report)
    };

    output_result(
        "Pipeline completed",
        &PipelineResult {
            transform,
            classify,
            stats,
        },
        cli_args,
    )
}
