//! Engine snapshot and restore.
//!
//! The snapshot is the CBOR encoding of [`GovernorState`]: the proposal
//! array with per-proposal voter ledgers, the parameter record, both
//! whitelists, the role sets and the pause flag. The event log is not part
//! of it; export it separately with `export_events_json`.

use super::roles::Role;
use super::{Collaborators, Governor, GovernorState};
use crate::error::{GovernanceError, GovernanceResult};
use crate::serialization::{from_cbor, to_cbor};

impl Governor {
    pub fn export_state(&self) -> GovernanceResult<Vec<u8>> {
        let state = self.state().clone();
        to_cbor(&state).map_err(|e| GovernanceError::Persistence(e.to_string()))
    }

    /// Rebuild an engine from `export_state` output.
    pub fn restore(bytes: &[u8], collaborators: Collaborators) -> GovernanceResult<Self> {
        let state = decode_state(bytes)?;
        Ok(Self::from_state(state, collaborators))
    }
}

/// Decode and check a snapshot without building an engine.
pub fn decode_state(bytes: &[u8]) -> GovernanceResult<GovernorState> {
    let state: GovernorState =
        from_cbor(bytes).map_err(|e| GovernanceError::Persistence(e.to_string()))?;
    state.proposals.check_consistency()?;
    if state.roles.members(Role::Administrator).is_empty() {
        return Err(GovernanceError::Persistence(
            "snapshot has no administrator".to_string(),
        ));
    }
    if state.engine_address.is_zero() {
        return Err(GovernanceError::Persistence(
            "snapshot has a zero engine address".to_string(),
        ));
    }
    state.params.validate()?;
    Ok(state)
}
