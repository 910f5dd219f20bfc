//! Options governing how documents are read and written.

/// Options for [`Reader`](crate::reader::Reader).
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Raise detected irregularities as errors instead of correcting them with a logged warning.
    pub strict: bool,
    /// Upper bound on the output of a single Flate, LZW or JBIG2 decode.
    pub max_decoded_size: usize,
    /// Keep free (type 0) records of cross-reference streams.
    pub include_free_entries: bool,
    /// Maximum nesting of arrays and dictionaries, and maximum depth of the page tree.
    pub max_depth: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            strict: false,
            max_decoded_size: 75_000_000,
            include_free_entries: false,
            max_depth: 256,
        }
    }
}

impl ReadOptions {
    pub fn strict() -> Self {
        ReadOptions { strict: true, ..Default::default() }
    }

    pub fn with_strict(self, strict: bool) -> Self {
        ReadOptions { strict, ..self }
    }

    pub fn with_max_decoded_size(self, max_decoded_size: usize) -> Self {
        ReadOptions { max_decoded_size, ..self }
    }

    pub fn with_free_entries(self, include_free_entries: bool) -> Self {
        ReadOptions { include_free_entries, ..self }
    }

    pub fn with_max_depth(self, max_depth: usize) -> Self {
        ReadOptions { max_depth, ..self }
    }
}

/// Options for [`Writer`](crate::writer::Writer).
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Flate-compress the cross-reference stream of an incremental update.
    pub compress_xref_stream: bool,
    /// Header version of newly created documents. Documents loaded from a file keep their own
    /// unless this is set explicitly.
    pub version: Option<(u8, u8)>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions { compress_xref_stream: true, version: None }
    }
}

impl WriteOptions {
    pub fn with_compress_xref_stream(self, compress_xref_stream: bool) -> Self {
        WriteOptions { compress_xref_stream, ..self }
    }

    pub fn with_version(self, major: u8, minor: u8) -> Self {
        WriteOptions { version: Some((major, minor)), ..self }
    }
}
