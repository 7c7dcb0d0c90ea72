use stakegov::config::GovernorConfig;
use stakegov::governance::ParamKind;
use stakegov::logging::{self, LoggingError};
use stakegov::types::TOKEN_DECIMALS;
use std::path::Path;

/// Load and validate a configuration file, then print the effective settings.
pub fn execute(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = GovernorConfig::load(path)?;
    match logging::init(&config.logging) {
        Ok(()) | Err(LoggingError::Install(_)) => {}
        Err(e) => return Err(e.into()),
    }
    let setup = config.to_setup()?;
    tracing::info!(path = %path.display(), engine = %setup.engine_address, "configuration validated");

    println!("Configuration OK: {}", path.display());
    println!();
    println!("Engine: {}", setup.engine_address);
    println!("Parameters:");
    for kind in ParamKind::ALL {
        println!("  {:<28} {}", kind.to_string(), describe(kind, setup.params.get(kind)));
    }
    println!("Administrators:");
    for admin in &setup.administrators {
        println!("  {}", admin);
    }
    println!("Guardians:");
    for guardian in &setup.guardians {
        println!("  {}", guardian);
    }
    println!(
        "Whitelist: {} selector(s), {} target(s)",
        setup.allowed_selectors.len(),
        setup.allowed_targets.len()
    );
    Ok(())
}

fn describe(kind: ParamKind, value: u128) -> String {
    match kind {
        ParamKind::VotingDuration
        | ParamKind::MinVotingDuration
        | ParamKind::MaxVotingDuration => {
            humantime::format_duration(std::time::Duration::from_secs(value as u64)).to_string()
        }
        ParamKind::Quorum | ParamKind::ProposalThreshold | ParamKind::StakeAmount => {
            format!("{} tokens", value / 10u128.pow(TOKEN_DECIMALS))
        }
        ParamKind::DefeatedRefundPercentage
        | ParamKind::CanceledRefundPercentage
        | ParamKind::ExpiredRefundPercentage => format!("{}%", value),
    }
}
