use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::base::{Dict, Error};

/// An external JBIG2 decoder.
pub trait Jbig2Decoder {
    /// Decodes an embedded JBIG2 stream, optionally preceded by the global segments, into an 
    /// image. Implementations should not produce more than `max_output` bytes.
    fn decode(&self, data: &[u8], globals: Option<&[u8]>, params: &Dict, max_output: usize)
        -> Result<Vec<u8>, Error>;
}

/// Runs the `jbig2dec` program (version 0.15 or newer), producing a PNG image.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jbig2Process;

static NEXT_FILE: AtomicU32 = AtomicU32::new(0);

// Removes the temporary files when dropped.
struct TempFiles(Vec<PathBuf>);

impl TempFiles {
    fn create(&mut self, data: &[u8]) -> Result<PathBuf, Error> {
        let path = std::env::temp_dir().join(format!("pdfrw-jbig2-{}-{}",
            std::process::id(), NEXT_FILE.fetch_add(1, Ordering::Relaxed)));
        self.0.push(path.clone());
        std::fs::write(&path, data)?;
        Ok(path)
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.0 {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn unavailable(err: impl std::fmt::Display) -> Error {
    Error::DependencyUnavailable(format!("jbig2dec: {err}"))
}

fn parse_version(output: &[u8]) -> Option<(u32, u32)> {
    let text = std::str::from_utf8(output).ok()?;
    let version = text.split_whitespace().find(|w| w.starts_with(|c: char| c.is_ascii_digit()))?;
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

impl Jbig2Process {
    fn check_version(&self) -> Result<(), Error> {
        let output = Command::new("jbig2dec")
            .arg("--version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(unavailable)?;
        match parse_version(&output.stdout) {
            Some(version) if version >= (0, 15) => Ok(()),
            Some((major, minor)) => Err(unavailable(format!("version {major}.{minor} too old, need 0.15"))),
            None => Err(unavailable("could not determine version"))
        }
    }
}

impl Jbig2Decoder for Jbig2Process {
    fn decode(&self, data: &[u8], globals: Option<&[u8]>, _params: &Dict, max_output: usize)
        -> Result<Vec<u8>, Error>
    {
        self.check_version()?;
        let mut files = TempFiles(Vec::new());
        let mut cmd = Command::new("jbig2dec");
        cmd.args(["--embedded", "--format", "png", "--output", "-"]);
        if let Some(globals) = globals {
            cmd.arg(files.create(globals)?);
        }
        cmd.arg(files.create(data)?);
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(unavailable)?;
        let mut out = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            stdout.take((max_output as u64).saturating_add(1)).read_to_end(&mut out)?;
        }
        if out.len() > max_output {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::DecompressionLimitExceeded { limit: max_output });
        }
        let status = child.wait()?;
        if !status.success() {
            return Err(unavailable(format!("exited with {status}")));
        }
        Ok(out)
    }
}
