//! Process-wide registry of live pin handles.
//!
//! Every pin handle registers itself under the [`ResourceKey`] of the physical
//! pin it drives. Handles that share a key are grouped into one registration,
//! and at most one of them may hold the exclusive drive lock at a time. The
//! registry never touches hardware; it only tracks identity and arbitrates the
//! lock flag.

mod error;
mod handle;
mod key;
mod registration;
mod registry;

// Links the std critical-section implementation behind CriticalSectionRawMutex.
use critical_section as _;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

pub use error::RegistryError;
pub use handle::{ExclusiveGuard, HandleId, PinLease};
pub use key::{PinKind, ResourceKey};
pub use registration::{Arbitration, LockState, LockStatus, RegistrationSnapshot};
pub use registry::PinRegistry;

/// Registry shared by every pin handle in the process.
pub static PIN_REGISTRY: PinRegistry<CriticalSectionRawMutex> =
    PinRegistry::new();
