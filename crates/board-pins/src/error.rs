use std::path::PathBuf;

use derive_more::{Display, Error, From};
use pin_registry::{PinKind, RegistryError, ResourceKey};

#[derive(Debug, Display, Error, From)]
pub enum PinError {
    /// Reading or writing a control file failed.
    #[display("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A control file held something other than what the property expects.
    #[display("unexpected contents {raw:?} in {} (expected {expected})", path.display())]
    Parse {
        path: PathBuf,
        raw: String,
        expected: &'static str,
    },
    /// A layout file is not valid JSON for [`SysfsLayout`](crate::SysfsLayout).
    #[display("invalid layout {}: {source}", path.display())]
    Layout {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Another handle holds the pin's drive lock.
    #[display("{key} is held by another handle")]
    Busy { key: ResourceKey },
    /// The device index does not exist for this kind of pin.
    #[display("no {kind} device with index {device}")]
    InvalidDevice { kind: PinKind, device: u32 },
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] String),
    #[display("pin registry: {_0}")]
    #[from]
    Registry(RegistryError),
}
