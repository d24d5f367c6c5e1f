//! DocPart Core — element model, metadata envelope, error taxonomy.

pub mod element;
pub mod error;

pub use element::{Element, ElementCategory, ElementMetadata, RegexMatch};
pub use error::{Error, Result};
