//! Role, parameter, whitelist and pause administration.
//!
//! Parameter and role changes are open to administrators and to the
//! scheduler bridge (so executed proposals and timelocked admin actions can
//! reach them). Whitelist edits are administrator-only. Pause and unpause
//! are open to guardians, administrators and the bridge.

use super::events::EventKind;
use super::params::ParamKind;
use super::roles::Role;
use super::{Governor, GovernorState};
use crate::error::{GovernanceError, GovernanceResult};
use crate::types::{Address, Selector};
use tracing::{info, warn};

impl Governor {
    fn is_admin_or_bridge(&self, s: &GovernorState, caller: &Address) -> bool {
        s.roles.has_role(Role::Administrator, caller) || *caller == self.scheduler.address()
    }

    pub fn grant_role(&self, caller: &Address, role: Role, account: Address) -> GovernanceResult<bool> {
        self.ensure_not_paused()?;
        if account.is_zero() {
            return Err(GovernanceError::InvalidInput(
                "account must not be zero".to_string(),
            ));
        }
        let granted = {
            let mut s = self.state();
            if !self.is_admin_or_bridge(&s, caller) {
                return Err(GovernanceError::NotAuthorized);
            }
            s.roles.grant(role, account)
        };
        if granted {
            info!(role = %role, account = %account, actor = %caller, "role granted");
            self.emit(caller, EventKind::RoleGranted { role, account });
        }
        Ok(granted)
    }

    /// Revoke a role. The last administrator cannot be removed.
    pub fn revoke_role(&self, caller: &Address, role: Role, account: &Address) -> GovernanceResult<bool> {
        self.ensure_not_paused()?;
        let revoked = {
            let mut s = self.state();
            if !self.is_admin_or_bridge(&s, caller) {
                return Err(GovernanceError::NotAuthorized);
            }
            s.roles.revoke(role, account)?
        };
        if revoked {
            info!(role = %role, account = %account, actor = %caller, "role revoked");
            self.emit(
                caller,
                EventKind::RoleRevoked {
                    role,
                    account: *account,
                },
            );
        }
        Ok(revoked)
    }

    /// Unified parameter setter. Returns the previous value.
    pub fn set_parameter(&self, caller: &Address, kind: ParamKind, value: u128) -> GovernanceResult<u128> {
        self.ensure_not_paused()?;
        let old = {
            let mut s = self.state();
            if !self.is_admin_or_bridge(&s, caller) {
                return Err(GovernanceError::NotAuthorized);
            }
            s.params.set(kind, value)?
        };
        info!(parameter = %kind, old, new = value, actor = %caller, "parameter updated");
        self.emit(
            caller,
            EventKind::ParameterUpdated {
                parameter: kind,
                old,
                new: value,
            },
        );
        Ok(old)
    }

    pub fn set_selector_whitelisted(
        &self,
        caller: &Address,
        selector: Selector,
        allowed: bool,
    ) -> GovernanceResult<()> {
        self.ensure_not_paused()?;
        {
            let mut s = self.state();
            if !s.roles.has_role(Role::Administrator, caller) {
                return Err(GovernanceError::NotAuthorized);
            }
            s.whitelist.set_selector(selector, allowed);
        }
        info!(selector = %selector, allowed, actor = %caller, "selector whitelist updated");
        self.emit(caller, EventKind::SelectorWhitelisted { selector, allowed });
        Ok(())
    }

    pub fn set_target_whitelisted(
        &self,
        caller: &Address,
        target: Address,
        allowed: bool,
    ) -> GovernanceResult<()> {
        self.ensure_not_paused()?;
        if target.is_zero() {
            return Err(GovernanceError::InvalidInput(
                "target must not be zero".to_string(),
            ));
        }
        {
            let mut s = self.state();
            if !s.roles.has_role(Role::Administrator, caller) {
                return Err(GovernanceError::NotAuthorized);
            }
            s.whitelist.set_target(target, allowed);
        }
        info!(target = %target, allowed, actor = %caller, "target whitelist updated");
        self.emit(caller, EventKind::TargetWhitelisted { target, allowed });
        Ok(())
    }

    fn may_pause(&self, s: &GovernorState, caller: &Address) -> bool {
        s.roles.has_role(Role::Guardian, caller) || self.is_admin_or_bridge(s, caller)
    }

    /// Suspend every mutating entry point except `unpause`.
    pub fn pause(&self, caller: &Address) -> GovernanceResult<()> {
        {
            let mut s = self.state();
            if !self.may_pause(&s, caller) {
                return Err(GovernanceError::NotAuthorized);
            }
            if s.paused {
                return Err(GovernanceError::Paused);
            }
            s.paused = true;
        }
        warn!(actor = %caller, "governance paused");
        self.emit(caller, EventKind::Paused);
        Ok(())
    }

    pub fn unpause(&self, caller: &Address) -> GovernanceResult<()> {
        {
            let mut s = self.state();
            if !self.may_pause(&s, caller) {
                return Err(GovernanceError::NotAuthorized);
            }
            if !s.paused {
                return Err(GovernanceError::NotPaused);
            }
            s.paused = false;
        }
        info!(actor = %caller, "governance unpaused");
        self.emit(caller, EventKind::Unpaused);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::test_support::*;
    use crate::governance::VoteSupport;
    use crate::types::tokens;

    #[test]
    fn test_grant_and_revoke_roles() {
        let h = Harness::new();
        let new_guardian = Address::repeat(0x33);

        assert_eq!(
            h.governor.grant_role(&ANYONE, Role::Guardian, new_guardian),
            Err(GovernanceError::NotAuthorized)
        );
        assert!(h.governor.grant_role(&ADMIN, Role::Guardian, new_guardian).unwrap());
        assert!(!h.governor.grant_role(&ADMIN, Role::Guardian, new_guardian).unwrap());
        assert!(h.governor.has_role(Role::Guardian, &new_guardian));

        assert!(h
            .governor
            .revoke_role(&BRIDGE, Role::Guardian, &new_guardian)
            .unwrap());
        assert!(!h.governor.has_role(Role::Guardian, &new_guardian));

        let granted = h
            .governor
            .events()
            .iter()
            .filter(|e| matches!(e.kind, EventKind::RoleGranted { .. }))
            .count();
        assert_eq!(granted, 1);
    }

    #[test]
    fn test_last_administrator_cannot_be_revoked() {
        let h = Harness::new();
        assert_eq!(
            h.governor.revoke_role(&ADMIN, Role::Administrator, &ADMIN),
            Err(GovernanceError::LastAdministrator)
        );
        assert!(h.governor.has_role(Role::Administrator, &ADMIN));
    }

    #[test]
    fn test_guardian_cannot_grant() {
        let h = Harness::new();
        assert_eq!(
            h.governor.grant_role(&GUARDIAN, Role::Administrator, GUARDIAN),
            Err(GovernanceError::NotAuthorized)
        );
    }

    #[test]
    fn test_set_parameter() {
        let h = Harness::new();
        assert_eq!(
            h.governor.set_parameter(&ADMIN, ParamKind::Quorum, tokens(800)),
            Ok(tokens(500))
        );
        assert_eq!(h.governor.params().quorum, tokens(800));

        assert_eq!(
            h.governor.set_parameter(&GUARDIAN, ParamKind::Quorum, tokens(1)),
            Err(GovernanceError::NotAuthorized)
        );
        assert!(matches!(
            h.governor.set_parameter(&ADMIN, ParamKind::VotingDuration, 60),
            Err(GovernanceError::InvalidParameter { .. })
        ));
        assert!(matches!(
            h.governor.set_parameter(&BRIDGE, ParamKind::StakeAmount, 0),
            Err(GovernanceError::InvalidParameter { .. })
        ));
        assert_eq!(h.governor.params().voting_duration, 86_400);

        assert_eq!(
            h.governor.set_parameter(&ADMIN, ParamKind::MinVotingDuration, 60),
            Ok(3_600)
        );
        h.governor
            .set_parameter(&ADMIN, ParamKind::VotingDuration, 60)
            .unwrap();
        assert!(matches!(
            h.governor.set_parameter(&ADMIN, ParamKind::MaxVotingDuration, 59),
            Err(GovernanceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_whitelist_admin_only() {
        let h = Harness::new();
        let selector = Selector([1, 2, 3, 4]);
        assert_eq!(
            h.governor.set_selector_whitelisted(&BRIDGE, selector, true),
            Err(GovernanceError::NotAuthorized)
        );
        h.governor
            .set_selector_whitelisted(&ADMIN, selector, true)
            .unwrap();
        assert!(h.governor.is_selector_whitelisted(&selector));

        h.governor
            .set_target_whitelisted(&ADMIN, CALL_TARGET, false)
            .unwrap();
        assert!(!h.governor.is_target_whitelisted(&CALL_TARGET));
    }

    #[tokio::test]
    async fn test_pause_blocks_mutations() {
        let h = Harness::new();
        let id = h.active_proposal().await;

        assert_eq!(h.governor.pause(&ANYONE), Err(GovernanceError::NotAuthorized));
        h.governor.pause(&GUARDIAN).unwrap();
        assert!(h.governor.is_paused());
        assert_eq!(h.governor.pause(&ADMIN), Err(GovernanceError::Paused));

        let snapshot = h.governor.proposal(id).unwrap().snapshot;
        h.ledger.set_voting_power(snapshot, VOTER_X, tokens(10));
        assert_eq!(
            h.governor.cast_vote(&VOTER_X, id, VoteSupport::For).await,
            Err(GovernanceError::Paused)
        );
        assert_eq!(
            h.create_general(PROPOSER).await,
            Err(GovernanceError::Paused)
        );
        assert_eq!(
            h.governor.set_parameter(&ADMIN, ParamKind::Quorum, 1),
            Err(GovernanceError::Paused)
        );

        // reads keep working
        assert_eq!(h.governor.proposal_count(), 1);

        h.governor.unpause(&BRIDGE).unwrap();
        assert_eq!(h.governor.unpause(&ADMIN), Err(GovernanceError::NotPaused));
        h.governor
            .cast_vote(&VOTER_X, id, VoteSupport::For)
            .await
            .unwrap();
    }
}
