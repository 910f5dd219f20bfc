//! Reading, modifying and writing PDF documents.
//!
//! The [`reader::Reader`] gives access to the indirect objects of an existing file, the
//! [`writer::Writer`] builds a new object table (possibly from a reader or by cloning objects
//! from other documents) and serializes it, either as a new file or as an incremental update.

pub mod base;
pub mod parser;
pub mod codecs;
pub mod crypto;
pub mod config;
pub mod reader;
pub mod writer;

mod utils;

pub use base::*;
pub use config::{ReadOptions, WriteOptions};
pub use reader::Reader;
pub use writer::{CloneOptions, Writer};
