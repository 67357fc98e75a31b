//! # Protocol Events
//!
//! Fund-level events live in each fund's history. Everything that changes
//! protocol-wide state (ownership, deployer generations, migration requests,
//! global configuration) is appended to a [`ProtocolLog`] instead.

use fl_04_comptroller::ReleaseStatus;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Selector, U256};

/// Protocol-wide state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolEvent {
    /// Dispatcher ownership nominee set.
    NominatedOwnerSet {
        /// Nominee.
        nominee: Address,
    },
    /// Dispatcher ownership nomination withdrawn.
    NominatedOwnerRemoved {
        /// Former nominee.
        nominee: Address,
    },
    /// Dispatcher ownership claimed.
    OwnershipTransferred {
        /// Previous owner.
        prev_owner: Address,
        /// New owner.
        next_owner: Address,
    },
    /// Protocol controller ownership moved.
    ControllerOwnershipTransferred {
        /// Previous owner.
        prev_owner: Address,
        /// New owner.
        next_owner: Address,
    },
    /// Generation that deploys new funds changed.
    CurrentFundDeployerSet {
        /// Previous generation (zero when unset).
        prev_fund_deployer: Address,
        /// New generation.
        next_fund_deployer: Address,
    },
    /// Migration waiting period changed.
    MigrationTimelockSet {
        /// Previous timelock in seconds.
        prev_timelock: u64,
        /// New timelock in seconds.
        next_timelock: u64,
    },
    /// Symbol of newly deployed shares changed.
    SharesTokenSymbolSet {
        /// New symbol.
        symbol: String,
    },
    /// A new vault entered the registry.
    VaultProxyDeployed {
        /// Deploying generation.
        fund_deployer: Address,
        /// Vault id.
        vault: Address,
        /// Vault owner.
        owner: Address,
        /// First accessor.
        comptroller: Address,
        /// Fund name.
        fund_name: String,
    },
    /// A comptroller configuration was created by a generation.
    ComptrollerConfigCreated {
        /// Deploying generation.
        fund_deployer: Address,
        /// Comptroller id.
        comptroller: Address,
        /// Account that requested it.
        creator: Address,
    },
    /// A fund was created end to end.
    NewFundCreated {
        /// Account that requested it.
        creator: Address,
        /// Vault id.
        vault: Address,
        /// First accessor.
        comptroller: Address,
        /// Denomination asset.
        denomination_asset: Address,
    },
    /// Migration request stored.
    MigrationSignaled {
        /// Vault id.
        vault: Address,
        /// Source generation.
        prev_fund_deployer: Address,
        /// Target generation.
        next_fund_deployer: Address,
        /// Incoming accessor.
        next_comptroller: Address,
        /// Earliest execution time.
        executable_at: u64,
    },
    /// Migration request executed.
    MigrationExecuted {
        /// Vault id.
        vault: Address,
        /// Source generation.
        prev_fund_deployer: Address,
        /// Target generation.
        next_fund_deployer: Address,
        /// New accessor.
        next_comptroller: Address,
        /// Whether the timelock and caller checks were skipped.
        emergency: bool,
    },
    /// Migration request withdrawn.
    MigrationCancelled {
        /// Vault id.
        vault: Address,
        /// Target generation.
        next_fund_deployer: Address,
        /// Discarded accessor.
        next_comptroller: Address,
    },
    /// Release status of a generation changed.
    ReleaseStatusSet {
        /// Generation.
        fund_deployer: Address,
        /// Previous status.
        prev_status: ReleaseStatus,
        /// New status.
        next_status: ReleaseStatus,
    },
    /// A vault call was allowed.
    VaultCallRegistered {
        /// Generation.
        fund_deployer: Address,
        /// Contract.
        target: Address,
        /// Function selector.
        selector: Selector,
    },
    /// A vault call was disallowed.
    VaultCallDeregistered {
        /// Generation.
        fund_deployer: Address,
        /// Contract.
        target: Address,
        /// Function selector.
        selector: Selector,
    },
    /// Denomination asset approved.
    DenominationAssetAdded {
        /// Asset.
        asset: Address,
    },
    /// Denomination asset approval withdrawn.
    DenominationAssetRemoved {
        /// Asset.
        asset: Address,
    },
    /// Parameter bounds of a fee or policy set.
    ParameterRangeSet {
        /// Fee or policy id.
        module: Address,
        /// Lower bounds.
        min: Vec<U256>,
        /// Upper bounds.
        max: Vec<U256>,
    },
    /// Parameter bounds of a fee or policy removed.
    ParameterRangeRemoved {
        /// Fee or policy id.
        module: Address,
    },
    /// Management fee split changed.
    ManagementFeeSplitUpdated {
        /// Owner portion.
        vault_owner: U256,
        /// Staking pool portion (and the DAO portion).
        staking_and_dao: U256,
    },
    /// Performance fee owner split changed.
    PerformanceFeeSplitUpdated {
        /// Owner split with nothing staked.
        base: U256,
        /// Owner split ceiling.
        max: U256,
    },
    /// Fee recipient or token changed.
    FeeEnvironmentAddressUpdated {
        /// Which address: `staking_pool`, `dao` or `investment_token`.
        field: String,
        /// New value.
        address: Address,
    },
}

/// A protocol event and the time it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedProtocolEvent {
    /// Clock time of the call.
    pub timestamp: u64,
    /// The event.
    pub event: ProtocolEvent,
}

/// Append-only protocol event log shared by the dispatcher, the deployer
/// generations and the protocol controller.
#[derive(Debug, Default)]
pub struct ProtocolLog {
    events: RwLock<Vec<RecordedProtocolEvent>>,
}

impl ProtocolLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event`.
    pub fn record(&self, timestamp: u64, event: ProtocolEvent) {
        self.events
            .write()
            .push(RecordedProtocolEvent { timestamp, event });
    }

    /// Every event so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedProtocolEvent> {
        self.events.read().clone()
    }

    /// Number of events recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}
