pub mod types {
    /// Object number: type alias for `u32`.
    pub type ObjNum = u32;
    /// Object generation: type alias for `u16`.
    ///
    /// PDF 1.5 technically allows larger generation numbers via xref streams. Those are rejected 
    /// as malformed.
    pub type ObjGen = u16;
    /// Index within an object stream: type alias for `u32`.
    pub type ObjIndex = u32;
    /// Offset within a file (relative to the `%PDF` marker): type alias for `u64`.
    pub type Offset = u64;
}

mod name;
pub use name::*;

mod number;
pub use number::*;

mod dict;
pub use dict::*;

mod object;
pub use object::*;

mod stream;
pub use stream::*;

mod string;
pub use string::decode_text;

mod xref;
pub use xref::*;

mod locator;
pub use locator::*;

mod resolver;
pub use resolver::*;

mod error;
pub use error::*;

mod header;
pub use header::*;
