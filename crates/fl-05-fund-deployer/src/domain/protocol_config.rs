//! # Protocol Configuration
//!
//! Owner-settable, protocol-wide settings that are not part of the fee
//! environment: approved denomination assets and module parameter ranges.

use crate::errors::DeployerError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, U256};
use std::collections::{BTreeMap, BTreeSet};

/// Inclusive bounds per parameter of a fee or policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRange {
    /// Lower bound per parameter.
    pub min: Vec<U256>,
    /// Upper bound per parameter.
    pub max: Vec<U256>,
}

/// Global configuration record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    denominations: BTreeSet<Address>,
    ranges: BTreeMap<Address, ParameterRange>,
}

impl ProtocolConfig {
    /// Empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether funds may be denominated in `asset`.
    #[must_use]
    pub fn is_denomination_approved(&self, asset: Address) -> bool {
        self.denominations.contains(&asset)
    }

    /// Approved denomination assets.
    pub fn denominations(&self) -> impl Iterator<Item = Address> + '_ {
        self.denominations.iter().copied()
    }

    /// Approves `assets`; either all of them or none.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for the zero address or an asset already approved.
    pub fn add_denominations(&mut self, assets: &[Address]) -> Result<(), DeployerError> {
        let mut next = self.denominations.clone();
        for asset in assets {
            if asset.is_zero() {
                return Err(DeployerError::InvalidArgument(
                    "Address should not be zero address",
                ));
            }
            if !next.insert(*asset) {
                return Err(DeployerError::InvalidArgument(
                    "addDenominationAssets: asset already added",
                ));
            }
        }
        self.denominations = next;
        Ok(())
    }

    /// Withdraws approval of `assets`; either all of them or none.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an asset that is not approved.
    pub fn remove_denominations(&mut self, assets: &[Address]) -> Result<(), DeployerError> {
        let mut next = self.denominations.clone();
        for asset in assets {
            if !next.remove(asset) {
                return Err(DeployerError::InvalidArgument(
                    "removeDenominationAssets: cannot remove a denomination that has not been added",
                ));
            }
        }
        self.denominations = next;
        Ok(())
    }

    /// Parameter bounds of `module`.
    #[must_use]
    pub fn parameter_range(&self, module: Address) -> Option<&ParameterRange> {
        self.ranges.get(&module)
    }

    /// Sets the bounds of `module`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for mismatched lengths or a lower bound above its
    /// upper bound.
    pub fn set_parameter_range(
        &mut self,
        module: Address,
        min: Vec<U256>,
        max: Vec<U256>,
    ) -> Result<(), DeployerError> {
        if min.len() != max.len() {
            return Err(DeployerError::InvalidArgument(
                "setFeeConfiguration: _parameterMinValues and _parameterMaxValues lengths must be equal",
            ));
        }
        if min.iter().zip(&max).any(|(low, high)| low > high) {
            return Err(DeployerError::InvalidArgument(
                "setFeeConfiguration: min value greater than max value",
            ));
        }
        self.ranges.insert(module, ParameterRange { min, max });
        Ok(())
    }

    /// Drops the bounds of `module`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when none are set.
    pub fn remove_parameter_range(&mut self, module: Address) -> Result<(), DeployerError> {
        self.ranges
            .remove(&module)
            .map(|_| ())
            .ok_or(DeployerError::InvalidArgument(
                "removeFeeConfiguration: fee configuration is not set",
            ))
    }
}
