// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Session, SessionSnapshot};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use tokio::sync::watch;

/// Session record, busy flag and the channel snapshots are published on
pub(crate) struct Shared {
    session: RwLock<Session>,
    busy: AtomicBool,
    tx: watch::Sender<SessionSnapshot>,
}

impl Shared {
    pub fn new(session: Session) -> Self {
        let (tx, _) = watch::channel(SessionSnapshot {
            session: session.clone(),
            busy: false,
        });
        Self {
            session: RwLock::new(session),
            busy: AtomicBool::new(false),
            tx,
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.read().clone(),
            busy: self.busy.load(Ordering::Acquire),
        }
    }

    pub fn publish(&self) {
        self.tx.send_replace(self.snapshot());
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }
}

/// Holds the busy flag for the duration of one action. Dropping it releases the flag on
/// every exit path and publishes the resulting session.
pub(crate) struct BusyGuard<'a> {
    shared: &'a Shared,
}

impl<'a> BusyGuard<'a> {
    pub fn acquire(shared: &'a Shared) -> Option<Self> {
        shared
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        shared.publish();
        Some(Self { shared })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.shared.busy.store(false, Ordering::Release);
        self.shared.publish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_exclusive() {
        let shared = Shared::new(Session::new(1));
        let rx = shared.subscribe();

        let guard = BusyGuard::acquire(&shared);
        assert!(guard.is_some());
        assert!(rx.borrow().busy);
        assert!(BusyGuard::acquire(&shared).is_none());

        drop(guard);
        assert!(!rx.borrow().busy);
        assert!(BusyGuard::acquire(&shared).is_some());
    }
}
