//! [`ContractCaller`] that records calls and replays configured responses.

use crate::ports::ContractCaller;
use parking_lot::{Mutex, RwLock};
use shared_types::{Address, Selector};
use std::collections::HashMap;

/// A call made through [`RecordingContractCaller`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Calling vault.
    pub vault: Address,
    /// Contract called.
    pub target: Address,
    /// Function selector.
    pub selector: Selector,
    /// Encoded arguments.
    pub args: Vec<u8>,
}

/// In-memory contract caller.
#[derive(Default)]
pub struct RecordingContractCaller {
    responses: RwLock<HashMap<(Address, Selector), Result<Vec<u8>, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingContractCaller {
    /// Caller answering every call with empty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outcome of calls to `(target, selector)`.
    pub fn respond(&self, target: Address, selector: Selector, response: Result<Vec<u8>, String>) {
        self.responses.write().insert((target, selector), response);
    }

    /// Calls made so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

impl ContractCaller for RecordingContractCaller {
    fn call(
        &self,
        vault: Address,
        target: Address,
        selector: Selector,
        args: &[u8],
    ) -> Result<Vec<u8>, String> {
        self.calls.lock().push(RecordedCall {
            vault,
            target,
            selector,
            args: args.to_vec(),
        });
        self.responses
            .read()
            .get(&(target, selector))
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
