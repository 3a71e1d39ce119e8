//! Feature extraction: turning preprocessed text into dense vectors.

pub mod lsi;
pub mod transformer;

pub use lsi::{LsiFiles, LsiTransformer};
pub use transformer::{Transformer, TransformerKind};
