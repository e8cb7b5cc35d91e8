use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use portable_atomic::{AtomicU64, Ordering};
use tracing::error;

use crate::error::RegistryError;
use crate::key::ResourceKey;
use crate::registration::{Arbitration, LockState, LockStatus};
use crate::registry::PinRegistry;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Stable identity of one pin handle.
///
/// Ids are never reused within a process, so an id stays meaningful even while
/// the object that owned it is being torn down. The counter is 64 bits wide and
/// cannot wrap in any realistic process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId(u64);

impl HandleId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw id. Ids built this way are not checked for uniqueness.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The numeric value of this id.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// RAII registration of one handle.
///
/// Creating a lease registers a fresh [`HandleId`] under `key`; dropping it
/// unregisters, which also releases the lock if this lease held it.
pub struct PinLease<'a, M: RawMutex> {
    registry: &'a PinRegistry<M>,
    key: ResourceKey,
    id: HandleId,
}

impl<'a, M: RawMutex> PinLease<'a, M> {
    /// Register a freshly allocated handle id under `key`.
    pub fn new(
        registry: &'a PinRegistry<M>,
        key: ResourceKey,
    ) -> Result<Self, RegistryError> {
        let id = HandleId::next();
        registry.register(key, id)?;
        Ok(Self { registry, key, id })
    }

    /// The pin this lease is bound to.
    #[inline]
    pub fn key(&self) -> ResourceKey {
        self.key
    }

    /// The handle id registered for this lease.
    #[inline]
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The registry this lease lives in.
    pub fn registry(&self) -> &'a PinRegistry<M> {
        self.registry
    }

    /// See [`PinRegistry::acquire_lock`].
    pub fn acquire_lock(&self) -> Result<Arbitration, RegistryError> {
        self.registry.acquire_lock(self.key, self.id)
    }

    /// See [`PinRegistry::release_lock`].
    pub fn release_lock(&self) -> Result<Arbitration, RegistryError> {
        self.registry.release_lock(self.key, self.id)
    }

    /// See [`PinRegistry::lock_status`].
    pub fn lock_status(&self) -> Result<LockStatus, RegistryError> {
        self.registry.lock_status(self.key, self.id)
    }

    /// See [`PinRegistry::is_locked`].
    pub fn is_locked(&self) -> Result<bool, RegistryError> {
        self.registry.is_locked(self.key, self.id)
    }

    /// Take the lock for the lifetime of the returned guard.
    ///
    /// Returns `Ok(None)` if another handle holds it. If this lease already
    /// holds the lock, the guard leaves it held when dropped.
    pub fn try_exclusive(
        &self,
    ) -> Result<Option<ExclusiveGuard<'_, 'a, M>>, RegistryError> {
        match self.registry.acquire_tracked(self.key, self.id)? {
            (Arbitration::Granted(_), fresh) => {
                Ok(Some(ExclusiveGuard { lease: self, release: fresh }))
            }
            (Arbitration::HeldByOther(_), _) => Ok(None),
        }
    }
}

impl<M: RawMutex> fmt::Debug for PinLease<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinLease")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}

impl<M: RawMutex> Drop for PinLease<'_, M> {
    fn drop(&mut self) {
        if let Err(err) = self.registry.unregister(self.key, self.id) {
            error!("[Registry] lease {} on {} failed to unregister: {err}", self.id, self.key);
        }
    }
}

/// Scoped hold on a lease's exclusive lock.
pub struct ExclusiveGuard<'l, 'a, M: RawMutex> {
    lease: &'l PinLease<'a, M>,
    release: bool,
}

impl<M: RawMutex> ExclusiveGuard<'_, '_, M> {
    /// The pin this guard holds.
    pub fn key(&self) -> ResourceKey {
        self.lease.key
    }

    /// Lock state while the guard lives.
    pub fn state(&self) -> LockState {
        LockState::Locked(self.lease.id)
    }
}

impl<M: RawMutex> Drop for ExclusiveGuard<'_, '_, M> {
    fn drop(&mut self) {
        if !self.release {
            return;
        }
        match self.lease.release_lock() {
            Ok(Arbitration::Granted(_)) => {}
            Ok(Arbitration::HeldByOther(holder)) => error!(
                "[Registry] guard for {} found {} held by {holder}",
                self.lease.id, self.lease.key
            ),
            Err(err) => error!("[Registry] guard release failed: {err}"),
        }
    }
}
