use super::{Name, ObjRef};

/// Every failure the library can report.
///
/// Which of these are raised and which are logged and corrected depends on
/// [`ReadOptions::strict`](crate::config::ReadOptions::strict). Some conditions are raised
/// regardless: [`Error::EmptyInput`], [`Error::UnsupportedFilter`],
/// [`Error::DecompressionLimitExceeded`], [`Error::EncryptionRequired`] and
/// [`Error::DependencyUnavailable`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(std::io::Error),
    #[error("unexpected end of input")]
    StreamTruncated,
    #[error("empty input")]
    EmptyInput,
    #[error("parse error: {0}")]
    Parse(&'static str),
    #[error("malformed header: {0}")]
    MalformedHeader(&'static str),
    #[error("malformed xref: {0}")]
    MalformedXref(&'static str),
    #[error("object {0} not found")]
    ObjectNotFound(ObjRef),
    #[error("stream data does not match /Length {0}")]
    StreamLengthMismatch(u64),
    #[error("unsupported filter {0}")]
    UnsupportedFilter(Name),
    #[error("decoded data exceeds the limit of {limit} bytes")]
    DecompressionLimitExceeded { limit: usize },
    #[error("document is encrypted and has not been decrypted")]
    EncryptionRequired,
    #[error("wrong password")]
    WrongPassword,
    #[error("external dependency unavailable: {0}")]
    DependencyUnavailable(String),
    #[error("write integrity: {0}")]
    WriteIntegrity(String),
    #[error("nesting deeper than {0} levels")]
    RecursionLimit(usize),
    #[error("object {0} already cached")]
    CacheConflict(ObjRef),
    #[error("corrupt data: {0}")]
    Decode(&'static str),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::StreamTruncated,
            _ => Error::Io(err)
        }
    }
}
