//! # Fund Cell
//!
//! One mutual-exclusion domain per vault.
//!
//! ```text
//! thread A: enter ──────── staged work ──────── commit/drop
//! thread B:        enter ··· waits ···························→ runs
//! thread A (token callback): enter → Err(Reentrance)
//! ```
//!
//! The lock is reentrant so a callback on the owning thread reaches the
//! `entered` flag instead of deadlocking; the flag turns that into
//! [`ComptrollerError::Reentrance`].
//!
//! The event history sits beside the record as an append-only log. Calls
//! stage a copy of the record only; their events are appended on commit.

use crate::domain::FundState;
use crate::errors::ComptrollerError;
use crate::events::RecordedEvent;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use shared_types::Address;
use std::cell::{Cell, RefCell};

struct Slot {
    entered: Cell<bool>,
    state: RefCell<FundState>,
    history: RefCell<Vec<RecordedEvent>>,
}

/// Lock-protected fund record.
pub struct FundCell {
    vault: Address,
    slot: ReentrantMutex<Slot>,
}

impl FundCell {
    /// Wraps `state`.
    #[must_use]
    pub fn new(state: FundState) -> Self {
        Self {
            vault: state.vault.address(),
            slot: ReentrantMutex::new(Slot {
                entered: Cell::new(false),
                state: RefCell::new(state),
                history: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Vault address.
    #[must_use]
    pub fn vault(&self) -> Address {
        self.vault
    }

    /// Takes the fund for a mutating call.
    ///
    /// # Errors
    ///
    /// `Reentrance` when the calling thread is already inside a call on
    /// this fund.
    pub fn enter(&self) -> Result<EntryGuard<'_>, ComptrollerError> {
        let guard = self.slot.lock();
        if guard.entered.replace(true) {
            return Err(ComptrollerError::Reentrance);
        }
        Ok(EntryGuard { guard })
    }

    /// Runs `f` against the committed record.
    pub fn read<R>(&self, f: impl FnOnce(&FundState) -> R) -> R {
        let guard = self.slot.lock();
        let state = guard.state.borrow();
        f(&state)
    }

    /// Copy of the committed record.
    #[must_use]
    pub fn snapshot(&self) -> FundState {
        self.read(FundState::clone)
    }

    /// Committed events from position `start` on, oldest first.
    #[must_use]
    pub fn history_since(&self, start: usize) -> Vec<RecordedEvent> {
        let guard = self.slot.lock();
        let history = guard.history.borrow();
        history.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Number of committed events.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.slot.lock().history.borrow().len()
    }
}

/// Exclusive access to a fund for the duration of one call.
///
/// Dropping the guard without [`EntryGuard::commit`] keeps the committed
/// record as it was.
pub struct EntryGuard<'a> {
    guard: ReentrantMutexGuard<'a, Slot>,
}

impl EntryGuard<'_> {
    /// Copy of the committed record to stage changes on.
    #[must_use]
    pub fn stage(&self) -> FundState {
        self.guard.state.borrow().clone()
    }

    /// Replaces the committed record and appends the call's events.
    pub fn commit(self, staged: FundState, events: impl IntoIterator<Item = RecordedEvent>) {
        *self.guard.state.borrow_mut() = staged;
        self.guard.history.borrow_mut().extend(events);
    }
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        self.guard.entered.set(false);
    }
}
