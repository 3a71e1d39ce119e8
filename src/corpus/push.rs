//! Append-only writer for a JSON-lines corpus.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::corpus::document::Document;
use crate::error::Result;
use crate::util::create_parent_dirs;

/// A new corpus file written one document per line.
///
/// Call [`PushCorpus::close`] to flush; dropping the corpus flushes on a
/// best-effort basis.
#[derive(Debug)]
pub struct PushCorpus {
    path: PathBuf,
    writer: BufWriter<File>,
    size: usize,
}

impl PushCorpus {
    /// Create (or truncate) the corpus file, creating parent directories.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        create_parent_dirs(path)?;
        let writer = BufWriter::new(File::create(path)?);
        info!("Save new corpus in '{}'", path.display());
        Ok(PushCorpus {
            path: path.to_path_buf(),
            writer,
            size: 0,
        })
    }

    pub fn add(&mut self, doc: &Document) -> Result<()> {
        serde_json::to_writer(&mut self.writer, doc)?;
        self.writer.write_all(b"\n")?;
        self.size += 1;
        Ok(())
    }

    pub fn add_docs<'a, I>(&mut self, docs: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        for doc in docs {
            self.add(doc)?;
        }
        Ok(())
    }

    /// Number of documents written so far.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the file, returning the number of documents written.
    pub fn close(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.size)
    }
}
