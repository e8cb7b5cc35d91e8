use std::path::Path;

use tracing::{error, trace};

use crate::error::PinError;

/// Moves strings in and out of pin control files.
pub trait PinTransport: Send + Sync {
    /// Replace the contents of the file at `path` with `data`.
    fn write(&self, path: &Path, data: &str) -> Result<(), PinError>;

    /// Read the first whitespace-delimited token of the file at `path`.
    fn read(&self, path: &Path) -> Result<String, PinError>;
}

/// Transport over the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysfsTransport {
    /// Read every write back and log a mismatch.
    pub confirm_writes: bool,
}

impl SysfsTransport {
    /// Plain writes, no read-back.
    pub const fn new() -> Self {
        Self { confirm_writes: false }
    }

    /// Every write is read back and compared.
    pub const fn confirming() -> Self {
        Self { confirm_writes: true }
    }
}

impl PinTransport for SysfsTransport {
    fn write(&self, path: &Path, data: &str) -> Result<(), PinError> {
        trace!("[Pin] writing {data:?} to {}", path.display());
        std::fs::write(path, data).map_err(|source| {
            error!("[Pin] write of {data:?} to {} failed: {source}", path.display());
            PinError::Io { path: path.to_owned(), source }
        })?;

        if self.confirm_writes {
            let stored = self.read(path)?;
            if stored != data.trim() {
                error!(
                    "[Pin] wrote {data:?} to {} but it reads back {stored:?}",
                    path.display()
                );
            }
        }
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<String, PinError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            error!("[Pin] read from {} failed: {source}", path.display());
            PinError::Io { path: path.to_owned(), source }
        })?;
        Ok(contents.split_whitespace().next().unwrap_or_default().to_owned())
    }
}
