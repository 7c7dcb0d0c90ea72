//! Administrator and guardian role membership.

use crate::error::{GovernanceError, GovernanceResult};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Privileged roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Administrator,
    Guardian,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Administrator => write!(f, "administrator"),
            Role::Guardian => write!(f, "guardian"),
        }
    }
}

/// Role sets. At least one administrator always remains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    administrators: BTreeSet<Address>,
    guardians: BTreeSet<Address>,
}

impl RoleRegistry {
    pub fn new(
        administrators: impl IntoIterator<Item = Address>,
        guardians: impl IntoIterator<Item = Address>,
    ) -> GovernanceResult<Self> {
        let registry = Self {
            administrators: administrators.into_iter().collect(),
            guardians: guardians.into_iter().collect(),
        };
        if registry.administrators.is_empty() {
            return Err(GovernanceError::LastAdministrator);
        }
        Ok(registry)
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.members(role).contains(account)
    }

    pub fn members(&self, role: Role) -> &BTreeSet<Address> {
        match role {
            Role::Administrator => &self.administrators,
            Role::Guardian => &self.guardians,
        }
    }

    /// Returns false if the account already held the role.
    pub(crate) fn grant(&mut self, role: Role, account: Address) -> bool {
        match role {
            Role::Administrator => self.administrators.insert(account),
            Role::Guardian => self.guardians.insert(account),
        }
    }

    /// Returns false if the account did not hold the role.
    pub(crate) fn revoke(&mut self, role: Role, account: &Address) -> GovernanceResult<bool> {
        match role {
            Role::Administrator => {
                if self.administrators.len() == 1 && self.administrators.contains(account) {
                    return Err(GovernanceError::LastAdministrator);
                }
                Ok(self.administrators.remove(account))
            }
            Role::Guardian => Ok(self.guardians.remove(account)),
        }
    }
}
