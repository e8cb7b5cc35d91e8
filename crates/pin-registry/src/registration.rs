use std::collections::BTreeSet;

use crate::handle::HandleId;
use crate::key::ResourceKey;

/// Lock field of a single registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked(HandleId),
}

impl LockState {
    /// The handle holding the lock, if any.
    pub fn holder(self) -> Option<HandleId> {
        match self {
            LockState::Unlocked => None,
            LockState::Locked(holder) => Some(holder),
        }
    }

    /// Whether any handle holds the lock.
    pub fn is_locked(self) -> bool {
        matches!(self, LockState::Locked(_))
    }
}

/// Lock state as seen by one particular handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Unlocked,
    HeldBySelf,
    HeldByOther(HandleId),
}

/// Outcome of a lock acquire or release attempt.
///
/// Contention is an expected condition and is reported here rather than as a
/// [`RegistryError`](crate::RegistryError).
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
    /// The request went through; carries the lock state afterwards.
    Granted(LockState),
    /// Another handle holds the lock. Nothing was changed.
    HeldByOther(HandleId),
}

impl Arbitration {
    /// `true` for [`Arbitration::Granted`].
    pub fn is_granted(self) -> bool {
        matches!(self, Arbitration::Granted(_))
    }
}

/// Point-in-time copy of one registration, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSnapshot {
    pub key: ResourceKey,
    pub handles: Vec<HandleId>,
    pub lock: LockState,
}

/// Bookkeeping for every live handle bound to one key.
///
/// `handles` is never empty while the registration sits in the table, and a
/// set `holder` is always a member of `handles`.
#[derive(Debug)]
pub(crate) struct Registration {
    key: ResourceKey,
    handles: BTreeSet<HandleId>,
    holder: Option<HandleId>,
}

impl Registration {
    pub(crate) fn new(key: ResourceKey) -> Self {
        Self { key, handles: BTreeSet::new(), holder: None }
    }

    pub(crate) fn contains(&self, handle: HandleId) -> bool {
        self.handles.contains(&handle)
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub(crate) fn lock_state(&self) -> LockState {
        match self.holder {
            Some(holder) => LockState::Locked(holder),
            None => LockState::Unlocked,
        }
    }

    pub(crate) fn status_for(&self, handle: HandleId) -> LockStatus {
        match self.holder {
            None => LockStatus::Unlocked,
            Some(holder) if holder == handle => LockStatus::HeldBySelf,
            Some(holder) => LockStatus::HeldByOther(holder),
        }
    }

    /// Returns `false` if the handle was already a member.
    pub(crate) fn insert(&mut self, handle: HandleId) -> bool {
        self.handles.insert(handle)
    }

    /// Removes a member, force-releasing the lock if it held it.
    ///
    /// Returns `false` if the handle was not a member.
    pub(crate) fn remove(&mut self, handle: HandleId) -> bool {
        if !self.handles.contains(&handle) {
            return false;
        }
        if self.holder == Some(handle) {
            self.holder = None;
        }
        self.handles.remove(&handle)
    }

    /// Caller must have checked membership.
    ///
    /// The flag is `true` only when this call moved the lock from free to
    /// held.
    pub(crate) fn acquire(&mut self, handle: HandleId) -> (Arbitration, bool) {
        match self.holder {
            None => {
                self.holder = Some(handle);
                (Arbitration::Granted(LockState::Locked(handle)), true)
            }
            Some(holder) if holder == handle => {
                (Arbitration::Granted(LockState::Locked(handle)), false)
            }
            Some(holder) => (Arbitration::HeldByOther(holder), false),
        }
    }

    /// Caller must have checked membership.
    pub(crate) fn release(&mut self, handle: HandleId) -> Arbitration {
        match self.holder {
            None => Arbitration::Granted(LockState::Unlocked),
            Some(holder) if holder == handle => {
                self.holder = None;
                Arbitration::Granted(LockState::Unlocked)
            }
            Some(holder) => Arbitration::HeldByOther(holder),
        }
    }

    pub(crate) fn snapshot(&self) -> RegistrationSnapshot {
        RegistrationSnapshot {
            key: self.key,
            handles: self.handles.iter().copied().collect(),
            lock: self.lock_state(),
        }
    }
}
