//! Two-step ownership: the owner nominates, the nominee claims.

use crate::errors::DeployerError;
use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Owner and pending nominee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    owner: Address,
    nominated: Option<Address>,
}

impl Ownership {
    /// Owned by `owner`, no nomination.
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            nominated: None,
        }
    }

    /// Current owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Pending nominee.
    #[must_use]
    pub fn nominated(&self) -> Option<Address> {
        self.nominated
    }

    /// Fails unless `caller` is the owner.
    ///
    /// # Errors
    ///
    /// `Unauthorized`.
    pub fn ensure_owner(&self, caller: Address) -> Result<(), DeployerError> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(DeployerError::Unauthorized("contract owner"))
        }
    }

    /// Nominates `next` to take over.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, or `InvalidArgument` for the zero address, the
    /// current owner or the current nominee.
    pub fn nominate(&mut self, caller: Address, next: Address) -> Result<(), DeployerError> {
        self.ensure_owner(caller)?;
        if next.is_zero() {
            return Err(DeployerError::InvalidArgument(
                "_nextNominatedOwner cannot be empty",
            ));
        }
        if next == self.owner {
            return Err(DeployerError::InvalidArgument(
                "_nextNominatedOwner is already the owner",
            ));
        }
        if self.nominated == Some(next) {
            return Err(DeployerError::InvalidArgument(
                "_nextNominatedOwner is already nominated",
            ));
        }
        self.nominated = Some(next);
        Ok(())
    }

    /// Withdraws the pending nomination and returns the former nominee.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, or `InvalidArgument` with nobody nominated.
    pub fn remove_nomination(&mut self, caller: Address) -> Result<Address, DeployerError> {
        self.ensure_owner(caller)?;
        self.nominated.take().ok_or(DeployerError::InvalidArgument(
            "removeNominatedOwner: There is no nominated owner",
        ))
    }

    /// Completes the transfer and returns the previous owner.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless `caller` is the nominee.
    pub fn claim(&mut self, caller: Address) -> Result<Address, DeployerError> {
        if self.nominated != Some(caller) {
            return Err(DeployerError::Unauthorized("nominatedOwner"));
        }
        self.nominated = None;
        Ok(std::mem::replace(&mut self.owner, caller))
    }
}
