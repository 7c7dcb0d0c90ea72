use serde::Serialize;
use stakegov::governance::persist::decode_state;
use stakegov::governance::{GovernorState, Role};
use stakegov::types::{Amount, ProposalId, Timestamp};
use std::path::Path;

/// Flattened proposal view for printing.
#[derive(Debug, Serialize)]
struct ProposalSummary {
    id: ProposalId,
    kind: String,
    proposer: String,
    description: String,
    created_at: Timestamp,
    deadline: Timestamp,
    snapshot: u64,
    stake: Amount,
    yes: Amount,
    no: Amount,
    abstain: Amount,
    voters: u64,
    queued: bool,
    executed: bool,
    canceled: bool,
    stake_refunded: bool,
    fingerprint: Option<String>,
}

fn summarize(state: &GovernorState) -> Vec<ProposalSummary> {
    state
        .proposals
        .iter()
        .map(|p| ProposalSummary {
            id: p.id,
            kind: p.kind().to_string(),
            proposer: p.proposer.to_string(),
            description: p.description.clone(),
            created_at: p.created_at,
            deadline: p.deadline,
            snapshot: p.snapshot.0,
            stake: p.stake,
            yes: p.tally.yes,
            no: p.tally.no,
            abstain: p.tally.abstain,
            voters: state
                .proposals
                .ledger(p.id)
                .map(|l| l.unique_voters())
                .unwrap_or(0),
            queued: p.flags.queued(),
            executed: p.flags.executed(),
            canceled: p.flags.canceled(),
            stake_refunded: p.flags.stake_refunded(),
            fingerprint: p.fingerprint.map(|f| f.to_string()),
        })
        .collect()
}

/// Decode a CBOR engine snapshot and print its contents.
pub fn execute(path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read state file '{}': {}", path.display(), e))?;
    let state = decode_state(&bytes)?;
    let proposals = summarize(&state);

    if json {
        println!("{}", serde_json::to_string_pretty(&proposals)?);
        return Ok(());
    }

    println!("Engine: {}", state.engine_address);
    println!("Paused: {}", state.paused);
    println!(
        "Administrators: {}  Guardians: {}",
        state.roles.members(Role::Administrator).len(),
        state.roles.members(Role::Guardian).len()
    );
    println!("Proposals: {}", proposals.len());
    for p in &proposals {
        let mut flags = Vec::new();
        if p.queued {
            flags.push("queued");
        }
        if p.executed {
            flags.push("executed");
        }
        if p.canceled {
            flags.push("canceled");
        }
        if p.stake_refunded {
            flags.push("stake-refunded");
        }
        println!();
        println!("#{} [{}] {}", p.id, p.kind, p.description);
        println!("  proposer {}  deadline {}  snapshot {}", p.proposer, p.deadline, p.snapshot);
        println!(
            "  yes {}  no {}  abstain {}  voters {}",
            p.yes, p.no, p.abstain, p.voters
        );
        println!("  flags: {}", if flags.is_empty() { "-".to_string() } else { flags.join(", ") });
        if let Some(fp) = &p.fingerprint {
            println!("  scheduler job {}", fp);
        }
    }
    Ok(())
}
