//! Lazy reader over a JSON-lines corpus.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use log::info;
use serde_json::Value;

use crate::corpus::document::Document;
use crate::error::{Result, XimlError};
use crate::util::check_file_readable;

/// A corpus read one document at a time, without loading the file.
#[derive(Debug, Clone)]
pub struct StreamCorpus {
    path: PathBuf,
}

impl StreamCorpus {
    /// Open a corpus; fails with a configuration error if the file is not
    /// readable.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        check_file_readable(path)?;
        info!("Corpus will look into documents from '{}'", path.display());
        Ok(StreamCorpus {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterate over the documents. Blank lines are ignored.
    pub fn docs(&self) -> Result<StreamCorpusIter> {
        let file = File::open(&self.path)
            .map_err(|e| XimlError::caught(format!("Opening '{}'", self.path.display()), e))?;
        Ok(StreamCorpusIter {
            path: self.path.clone(),
            lines: BufReader::new(file).lines(),
            line_num: 0,
        })
    }
}

/// Iterator returned by [`StreamCorpus::docs`].
#[derive(Debug)]
pub struct StreamCorpusIter {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_num: usize,
}

impl StreamCorpusIter {
    fn parse(&self, line: &str) -> Result<Document> {
        let context = || {
            format!(
                "Exception encountered when reading document on line {} of '{}'",
                self.line_num,
                self.path.display()
            )
        };
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(doc)) => Ok(doc),
            Ok(other) => Err(XimlError::caught(
                context(),
                format!("expected a JSON object, got {other}"),
            )),
            Err(e) => Err(XimlError::caught(context(), e)),
        }
    }
}

impl Iterator for StreamCorpusIter {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_num += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(XimlError::caught(
                        format!("Reading '{}'", self.path.display()),
                        e,
                    )));
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(self.parse(&line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;

    #[test]
    fn test_stream_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        fs::write(&path, "{\"id\": 1}\n\n{\"id\": 2, \"content\": \"a b\"}\n").unwrap();

        let corpus = StreamCorpus::new(&path).unwrap();
        let docs: Vec<Document> = corpus.docs().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["content"], "a b");
    }

    #[test]
    fn test_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        fs::write(&path, "{\"id\": 1}\n{oops\n[1, 2]\n").unwrap();

        let results: Vec<Result<Document>> = StreamCorpus::new(&path).unwrap().docs().unwrap().collect();
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Caught);
        assert!(err.to_string().contains("line 2"));
        assert_eq!(results[2].as_ref().unwrap_err().kind(), ErrorKind::Caught);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = StreamCorpus::new(dir.path().join("none.jsonl")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
