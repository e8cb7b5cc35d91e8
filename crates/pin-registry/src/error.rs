use derive_more::{Display, Error};

use crate::handle::HandleId;
use crate::key::ResourceKey;

/// Caller logic errors reported by the registry.
///
/// These mean a handle broke its lifecycle contract (registered twice, or used
/// after it unregistered). Lock contention is not an error; see
/// [`Arbitration`](crate::Arbitration).
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The handle is already a member of a registration.
    #[display("handle {handle} is already registered under {key}")]
    DuplicateRegistration { key: ResourceKey, handle: HandleId },
    /// The key has no registration, or the handle is not part of it.
    #[display("{} is not registered under {}", DisplayHandle(*handle), key)]
    NotRegistered {
        key: ResourceKey,
        handle: Option<HandleId>,
    },
}

struct DisplayHandle(Option<HandleId>);

impl core::fmt::Display for DisplayHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(handle) => write!(f, "handle {handle}"),
            None => f.write_str("no handle"),
        }
    }
}
