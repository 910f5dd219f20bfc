//! Lexer and object parser.
pub(crate) mod bp;
pub(crate) mod cc;
pub(crate) mod tk;
mod op;
mod fp;

pub use fp::{FileParser, Structural};
pub use op::ObjParser;
