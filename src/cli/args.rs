//! Command line argument parsing for the ximl CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::classify::ClassifierKind;
use crate::corpus::{BatchOptions, BatchPolicy};
use crate::transform::{LsiFiles, TransformerKind};

/// ximl - apply trained text classification models to JSON-lines corpora
#[derive(Parser, Debug, Clone)]
#[command(name = "ximl")]
#[command(about = "Apply trained feature extraction and classification models to document corpora")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct XimlArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl XimlArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Classify the documents of a features corpus
    Classify(ClassifyArgs),

    /// Add feature vectors to the documents of a corpus
    Transform(TransformArgs),

    /// Compute accuracy, precision and recall of classified corpora
    Stats(StatsArgs),

    /// Convert a JSON-lines projection dump into the binary model format
    Binarize(BinarizeArgs),

    /// Convert a binary model back into JSON lines
    Revert(RevertArgs),

    /// Run transform, classify and stats as configured in a pipeline file
    Run(RunArgs),
}

/// Options shared by the batch commands
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Documents processed in parallel before writing
    #[arg(short, long, default_value = "1000")]
    pub batch_size: usize,

    /// What to do with a document that cannot be processed
    #[arg(long, value_enum, default_value_t = BatchPolicy::Abort)]
    pub on_error: BatchPolicy,

    /// Number of worker threads (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

impl BatchArgs {
    pub fn options(&self) -> BatchOptions {
        BatchOptions {
            batch_size: self.batch_size,
            policy: self.on_error,
        }
    }
}

/// Arguments for classifying a corpus
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Input corpus with a `features` field (JSONL)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output corpus with `season` and `season_prob` added
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Model parameter file (JSON)
    #[arg(short, long, value_name = "MODEL_FILE")]
    pub model: PathBuf,

    /// Model kind (LogisticRegression or MLPClassifier)
    #[arg(short, long, default_value = "LogisticRegression")]
    pub kind: ClassifierKind,

    #[command(flatten)]
    pub batch: BatchArgs,
}

/// Arguments for transforming a corpus
#[derive(Parser, Debug, Clone)]
pub struct TransformArgs {
    /// Input corpus with a `content` field (JSONL)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output corpus with `features` added
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Transformer kind
    #[arg(short, long, default_value = "LSI")]
    pub kind: TransformerKind,

    /// Vocabulary file
    #[arg(long, value_name = "DICT_FILE")]
    pub dictionary: PathBuf,

    /// IDF weights file
    #[arg(long, value_name = "TFIDF_FILE")]
    pub tfidf: PathBuf,

    /// Binary projection model
    #[arg(long, value_name = "LSI_FILE")]
    pub lsi: PathBuf,

    #[command(flatten)]
    pub batch: BatchArgs,
}

impl TransformArgs {
    pub fn files(&self) -> LsiFiles {
        LsiFiles {
            dictionary: self.dictionary.clone(),
            tfidf: self.tfidf.clone(),
            lsi: self.lsi.clone(),
        }
    }
}

/// Arguments for prediction statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Classified corpora (JSONL)
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Comma-separated list of categories
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub categories: Vec<String>,

    /// Save the statistics to this file
    #[arg(short, long, value_name = "STATS_FILE")]
    pub output: Option<PathBuf>,

    /// Number of worker threads (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

/// Arguments for binarizing a model
#[derive(Parser, Debug, Clone)]
pub struct BinarizeArgs {
    /// JSON-lines projection dump
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Binary model file
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Only keep these row ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub ids: Option<Vec<u32>>,
}

/// Arguments for reverting a binary model
#[derive(Parser, Debug, Clone)]
pub struct RevertArgs {
    /// Binary model file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// JSON-lines output
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}

/// Arguments for a configured pipeline run
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Pipeline configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: PathBuf,

    /// Input corpus (JSONL)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory receiving features.jsonl, predictions.jsonl and stats.json
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
