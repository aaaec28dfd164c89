//! # apirev_doc
//!
//! Generic document tree for API descriptions reviewed by apirev.
//!
//! A description file (YAML or JSON) is loaded once into an immutable
//! [`DocNode`] tree. Every consumer reads it through total accessors that
//! return `None` for absent members instead of failing, so checks never
//! have to guard against malformed shapes themselves.
//!
//! ## Example
//!
//! ```rust,no_run
//! use apirev_doc::DocumentReader;
//!
//! let doc = DocumentReader::read_file("code/API_definitions/device-status.yaml").unwrap();
//! let version = doc.root().str_at(&["info", "version"]).unwrap_or("unknown");
//! println!("{} declares version {}", doc.source(), version);
//! ```

pub mod error;
pub mod node;
pub mod reader;

pub use error::{DocError, DocResult};
pub use node::{DocNode, Mapping, Scalar};
pub use reader::{Document, DocumentReader};
