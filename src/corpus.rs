//! JSON-lines document corpora.
//!
//! A corpus file holds one JSON object per line. [`StreamCorpus`] reads such a
//! file lazily, [`PushCorpus`] appends documents to a new one, and
//! [`batch::process_corpus`] maps one corpus onto another in parallel chunks.

pub mod batch;
pub mod document;
pub mod push;
pub mod stream;

pub use batch::{BatchOptions, BatchPolicy, BatchSummary, process_corpus};
pub use document::{Document, features_from_value, parse_features};
pub use push::PushCorpus;
pub use stream::StreamCorpus;
