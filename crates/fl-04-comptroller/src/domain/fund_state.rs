//! # Fund State
//!
//! The complete persisted record of one vault: the vault itself, its
//! comptroller records, the investment-fee locked balances, the referral
//! book and any pending migration request. The event history is kept
//! beside the record by [`crate::domain::FundCell`].
//!
//! ## Schema versions
//!
//! | Version | Change |
//! |---------|--------|
//! | 1 | vault, comptrollers, locked balances, migration |
//! | 2 | referral book and event history added |
//! | 3 | event history moved out of the record |
//!
//! [`FundState::from_json`] upgrades older records step by step.

use crate::domain::{ComptrollerRecord, ComptrollerStatus, MigrationRequest};
use crate::errors::ComptrollerError;
use fl_01_vault::VaultState;
use fl_02_fee_engine::{LockedBalances, ReferralBook};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::Address;
use std::collections::BTreeMap;

/// Current record layout.
pub const FUND_STATE_SCHEMA_VERSION: u32 = 3;

/// Persisted record of one vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundState {
    /// Record layout version.
    pub schema_version: u32,
    /// The vault.
    pub vault: VaultState,
    /// Comptroller records by id.
    pub comptrollers: BTreeMap<Address, ComptrollerRecord>,
    /// Investment-fee locked balances.
    pub locked: LockedBalances,
    /// Referee to referrer mapping.
    pub referrals: ReferralBook,
    /// Outstanding migration request.
    pub migration: Option<MigrationRequest>,
}

impl FundState {
    /// New fund with its first comptroller record.
    #[must_use]
    pub fn new(vault: VaultState, comptroller: ComptrollerRecord) -> Self {
        let mut comptrollers = BTreeMap::new();
        comptrollers.insert(comptroller.address, comptroller);
        Self {
            schema_version: FUND_STATE_SCHEMA_VERSION,
            vault,
            comptrollers,
            locked: LockedBalances::new(),
            referrals: ReferralBook::new(),
            migration: None,
        }
    }

    /// The vault's accessor comptroller.
    ///
    /// # Errors
    ///
    /// `UnknownComptroller` if the accessor has no record.
    pub fn active(&self) -> Result<&ComptrollerRecord, ComptrollerError> {
        self.comptroller(self.vault.accessor())
    }

    /// Record of `comptroller`.
    ///
    /// # Errors
    ///
    /// `UnknownComptroller`.
    pub fn comptroller(&self, comptroller: Address) -> Result<&ComptrollerRecord, ComptrollerError> {
        self.comptrollers
            .get(&comptroller)
            .ok_or(ComptrollerError::UnknownComptroller(comptroller))
    }

    /// Mutable record of `comptroller`.
    ///
    /// # Errors
    ///
    /// `UnknownComptroller`.
    pub fn comptroller_mut(
        &mut self,
        comptroller: Address,
    ) -> Result<&mut ComptrollerRecord, ComptrollerError> {
        self.comptrollers
            .get_mut(&comptroller)
            .ok_or(ComptrollerError::UnknownComptroller(comptroller))
    }

    /// The accessor's record, which must be `Active`.
    ///
    /// # Errors
    ///
    /// `UnknownComptroller` or `NotActive`.
    pub fn require_active(&self) -> Result<&ComptrollerRecord, ComptrollerError> {
        let record = self.active()?;
        if record.status != ComptrollerStatus::Active {
            return Err(ComptrollerError::NotActive {
                comptroller: record.address,
                status: record.status,
            });
        }
        Ok(record)
    }

    /// Serialises the record.
    ///
    /// # Errors
    ///
    /// `Schema` if serialisation fails.
    pub fn to_json(&self) -> Result<Vec<u8>, ComptrollerError> {
        serde_json::to_vec(self).map_err(|err| ComptrollerError::Schema(err.to_string()))
    }

    /// Decodes a record of any known version, upgrading it to the current
    /// layout.
    ///
    /// # Errors
    ///
    /// `Schema` for malformed input or an unknown future version.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ComptrollerError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|err| ComptrollerError::Schema(err.to_string()))?;
        let value = upgrade(value)?;
        serde_json::from_value(value).map_err(|err| ComptrollerError::Schema(err.to_string()))
    }
}

/// Upgrades a raw record to [`FUND_STATE_SCHEMA_VERSION`].
fn upgrade(mut value: Value) -> Result<Value, ComptrollerError> {
    let Some(object) = value.as_object_mut() else {
        return Err(ComptrollerError::Schema("fund state must be an object".into()));
    };
    let mut version = object
        .get("schema_version")
        .and_then(Value::as_u64)
        .unwrap_or(1);

    if version > u64::from(FUND_STATE_SCHEMA_VERSION) {
        return Err(ComptrollerError::Schema(format!(
            "unsupported schema version {version}"
        )));
    }
    if version == 1 {
        let referrals = serde_json::to_value(ReferralBook::new())
            .map_err(|err| ComptrollerError::Schema(err.to_string()))?;
        object.entry("referrals").or_insert(referrals);
        version = 2;
    }
    if version == 2 {
        object.remove("history");
        version = 3;
    }
    object.insert("schema_version".into(), Value::from(version));
    Ok(value)
}
