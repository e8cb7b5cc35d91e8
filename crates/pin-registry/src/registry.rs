use core::cell::RefCell;
use std::collections::BTreeMap;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use tracing::{debug, error, trace};

use crate::error::RegistryError;
use crate::handle::HandleId;
use crate::key::ResourceKey;
use crate::registration::{
    Arbitration, LockState, LockStatus, Registration, RegistrationSnapshot,
};

type Table = BTreeMap<ResourceKey, Registration>;

/// Table of live pin handles and their exclusive drive locks.
///
/// Every operation runs as one critical section over the whole table, so two
/// concurrent `acquire_lock` calls on the same key can never both be granted.
/// Nothing here waits: a lock held by another handle is reported back to the
/// caller immediately.
pub struct PinRegistry<M: RawMutex> {
    table: Mutex<M, RefCell<Table>>,
}

impl<M: RawMutex> PinRegistry<M> {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self { table: Mutex::new(RefCell::new(BTreeMap::new())) }
    }

    fn with_table<R>(&self, f: impl FnOnce(&mut Table) -> R) -> R {
        self.table.lock(|table| f(&mut table.borrow_mut()))
    }

    /// Add `handle` to the registration for `key`, creating it if needed.
    ///
    /// Fails with `DuplicateRegistration` if the handle is already registered,
    /// under this key or any other. The lock state is never touched.
    pub fn register(
        &self,
        key: ResourceKey,
        handle: HandleId,
    ) -> Result<(), RegistryError> {
        let result = self.with_table(|table| {
            if let Some((&existing, _)) =
                table.iter().find(|(_, reg)| reg.contains(handle))
            {
                return Err(RegistryError::DuplicateRegistration {
                    key: existing,
                    handle,
                });
            }
            let reg = table.entry(key).or_insert_with(|| Registration::new(key));
            reg.insert(handle);
            Ok(reg.len())
        });

        match result {
            Ok(count) => {
                debug!("[Registry] {handle} registered on {key} ({count} live)");
                Ok(())
            }
            Err(err) => {
                error!("[Registry] register refused: {err}");
                Err(err)
            }
        }
    }

    /// Remove `handle` from its registration.
    ///
    /// A lock held by the handle is released as part of leaving. Returns the
    /// lock state left behind, or `None` if this was the last handle and the
    /// registration is gone.
    pub fn unregister(
        &self,
        key: ResourceKey,
        handle: HandleId,
    ) -> Result<Option<LockState>, RegistryError> {
        let result = self.with_table(|table| {
            let reg = table.get_mut(&key).ok_or(
                RegistryError::NotRegistered { key, handle: Some(handle) },
            )?;
            let forced = reg.lock_state() == LockState::Locked(handle);
            if !reg.remove(handle) {
                return Err(RegistryError::NotRegistered {
                    key,
                    handle: Some(handle),
                });
            }
            if reg.is_empty() {
                table.remove(&key);
                Ok((forced, None))
            } else {
                Ok((forced, Some(reg.lock_state())))
            }
        });

        match result {
            Ok((forced, remaining)) => {
                if forced {
                    debug!("[Registry] {handle} left {key} holding the lock, released");
                }
                match remaining {
                    Some(_) => debug!("[Registry] {handle} unregistered from {key}"),
                    None => debug!("[Registry] {handle} unregistered, {key} removed"),
                }
                Ok(remaining)
            }
            Err(err) => {
                error!("[Registry] unregister refused: {err}");
                Err(err)
            }
        }
    }

    /// Try to take the exclusive lock for `key` on behalf of `handle`.
    ///
    /// Re-acquiring a lock the handle already holds is granted without change.
    pub fn acquire_lock(
        &self,
        key: ResourceKey,
        handle: HandleId,
    ) -> Result<Arbitration, RegistryError> {
        self.acquire_tracked(key, handle).map(|(outcome, _)| outcome)
    }

    /// [`acquire_lock`](Self::acquire_lock), also reporting whether this call
    /// took a free lock rather than finding it already held by `handle`.
    pub(crate) fn acquire_tracked(
        &self,
        key: ResourceKey,
        handle: HandleId,
    ) -> Result<(Arbitration, bool), RegistryError> {
        let (outcome, fresh) =
            self.with_member(key, handle, |reg| reg.acquire(handle))?;
        match outcome {
            Arbitration::Granted(_) => trace!("[Registry] {handle} holds {key}"),
            Arbitration::HeldByOther(holder) => {
                debug!("[Registry] {handle} denied {key}, held by {holder}")
            }
        }
        Ok((outcome, fresh))
    }

    /// Give up the exclusive lock for `key`.
    ///
    /// Releasing a free lock is granted without change; releasing another
    /// handle's lock is refused.
    pub fn release_lock(
        &self,
        key: ResourceKey,
        handle: HandleId,
    ) -> Result<Arbitration, RegistryError> {
        let outcome = self.with_member(key, handle, |reg| reg.release(handle))?;
        match outcome {
            Arbitration::Granted(_) => trace!("[Registry] {handle} released {key}"),
            Arbitration::HeldByOther(holder) => {
                debug!("[Registry] {handle} cannot release {key}, held by {holder}")
            }
        }
        Ok(outcome)
    }

    /// Lock state of `key` from the point of view of `handle`.
    pub fn lock_status(
        &self,
        key: ResourceKey,
        handle: HandleId,
    ) -> Result<LockStatus, RegistryError> {
        self.with_member(key, handle, |reg| reg.status_for(handle))
    }

    /// Whether any handle holds the lock for `key`.
    pub fn is_locked(
        &self,
        key: ResourceKey,
        handle: HandleId,
    ) -> Result<bool, RegistryError> {
        self.with_member(key, handle, |reg| reg.lock_state().is_locked())
    }

    /// The current lock holder for `key`, if any.
    pub fn query_holder(
        &self,
        key: ResourceKey,
    ) -> Result<Option<HandleId>, RegistryError> {
        let result = self.with_table(|table| {
            table
                .get(&key)
                .map(|reg| reg.lock_state().holder())
                .ok_or(RegistryError::NotRegistered { key, handle: None })
        });
        if let Err(err) = &result {
            error!("[Registry] holder query refused: {err}");
        }
        result
    }

    /// Number of live handles bound to `key`.
    pub fn handle_count(&self, key: ResourceKey) -> usize {
        self.with_table(|table| table.get(&key).map_or(0, Registration::len))
    }

    /// Number of keys with at least one live handle.
    pub fn registration_count(&self) -> usize {
        self.with_table(|table| table.len())
    }

    /// Copy of every registration, ordered by key.
    pub fn snapshot(&self) -> Vec<RegistrationSnapshot> {
        self.with_table(|table| table.values().map(Registration::snapshot).collect())
    }

    fn with_member<R>(
        &self,
        key: ResourceKey,
        handle: HandleId,
        f: impl FnOnce(&mut Registration) -> R,
    ) -> Result<R, RegistryError> {
        let result = self.with_table(|table| match table.get_mut(&key) {
            Some(reg) if reg.contains(handle) => Ok(f(reg)),
            _ => Err(RegistryError::NotRegistered { key, handle: Some(handle) }),
        });
        if let Err(err) = &result {
            error!("[Registry] lock request refused: {err}");
        }
        result
    }
}

impl<M: RawMutex> Default for PinRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}
