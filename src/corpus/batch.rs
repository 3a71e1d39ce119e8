//! Chunked, parallel mapping of one corpus onto another.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{error, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::corpus::document::Document;
use crate::corpus::push::PushCorpus;
use crate::corpus::stream::StreamCorpus;
use crate::error::{Result, XimlError};

/// What to do when a single document cannot be processed.
///
/// Only data errors are subject to the policy. Configuration and I/O
/// failures always stop the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BatchPolicy {
    /// Stop at the first bad document.
    #[default]
    Abort,
    /// Log a warning, leave the document out and carry on.
    Skip,
}

impl FromStr for BatchPolicy {
    type Err = XimlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(BatchPolicy::Abort),
            "skip" => Ok(BatchPolicy::Skip),
            _ => Err(XimlError::config(format!(
                "Unknown batch policy '{s}'. Choose from [\"abort\", \"skip\"]"
            ))),
        }
    }
}

impl fmt::Display for BatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchPolicy::Abort => f.write_str("abort"),
            BatchPolicy::Skip => f.write_str("skip"),
        }
    }
}

/// Settings shared by batch classification and transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Number of documents mapped in parallel before writing.
    pub batch_size: usize,
    pub policy: BatchPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            batch_size: 1000,
            policy: BatchPolicy::Abort,
        }
    }
}

/// Counters reported at the end of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Documents read from the input.
    pub read: usize,
    /// Documents written to the output.
    pub written: usize,
    /// Documents without the field the mapping needs.
    pub dropped: usize,
    /// Documents left out because of a data error.
    pub skipped: usize,
}

/// Read `input`, apply `map` to every document and write the results to
/// `output` in input order.
///
/// `map` returns `Ok(None)` for documents that should not be written.
/// Documents are written to a `.partial` file next to `output`, which is
/// renamed over `output` once the whole corpus is processed. An aborted batch
/// removes the partial file and leaves `output` untouched.
pub fn process_corpus<F>(
    input: &Path,
    output: &Path,
    options: &BatchOptions,
    map: F,
) -> Result<BatchSummary>
where
    F: Fn(Document) -> Result<Option<Document>> + Sync,
{
    let corpus = StreamCorpus::new(input)?;
    let mut docs = corpus.docs()?;
    let partial = partial_path(output);
    let mut out = PushCorpus::create(&partial)?;

    let result = map_chunks(input, &mut docs, &mut out, options, &map)
        .and_then(|summary| out.close().map(|_| summary));
    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            discard(&partial);
            return Err(e);
        }
    };
    if let Err(e) = fs::rename(&partial, output) {
        discard(&partial);
        return Err(e.into());
    }

    info!(
        "Saved {} of {} documents into '{}' ({} without input field, {} skipped)",
        summary.written,
        summary.read,
        output.display(),
        summary.dropped,
        summary.skipped
    );
    Ok(summary)
}

fn map_chunks<I, F>(
    input: &Path,
    docs: &mut I,
    out: &mut PushCorpus,
    options: &BatchOptions,
    map: &F,
) -> Result<BatchSummary>
where
    I: Iterator<Item = Result<Document>>,
    F: Fn(Document) -> Result<Option<Document>> + Sync,
{
    let batch_size = options.batch_size.max(1);
    let mut summary = BatchSummary::default();

    loop {
        let chunk: Vec<Document> = docs.by_ref().take(batch_size).collect::<Result<_>>()?;
        if chunk.is_empty() {
            break;
        }
        let first = summary.read + 1;
        summary.read += chunk.len();

        let results: Vec<Result<Option<Document>>> = chunk.into_par_iter().map(map).collect();
        for (offset, result) in results.into_iter().enumerate() {
            match result {
                Ok(Some(doc)) => {
                    out.add(&doc)?;
                    summary.written += 1;
                }
                Ok(None) => summary.dropped += 1,
                Err(e) if e.is_per_record() && options.policy == BatchPolicy::Skip => {
                    warn!("Skipping document {}: {e}", first + offset);
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!("Stopped at document {} of '{}'", first + offset, input.display());
                    return Err(e);
                }
            }
        }
    }
    Ok(summary)
}

/// `<output>.partial`, in the same directory so the final rename stays on one
/// filesystem.
fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}

fn discard(partial: &Path) {
    match fs::remove_file(partial) {
        Ok(()) => error!("Discarded partial output '{}'", partial.display()),
        Err(e) => error!("Could not remove partial output '{}': {e}", partial.display()),
    }
}
