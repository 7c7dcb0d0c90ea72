use stakegov::config::GovernorConfig;
use stakegov::types::Address;
use std::path::Path;

/// Write a commented default configuration file.
pub fn execute(
    output: &Path,
    engine_address: &str,
    admin: &str,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if output.exists() && !force {
        return Err(format!(
            "'{}' already exists (use --force to overwrite)",
            output.display()
        )
        .into());
    }

    let engine: Address = engine_address
        .parse()
        .map_err(|e| format!("invalid --engine-address '{}': {}", engine_address, e))?;
    let admin: Address = admin
        .parse()
        .map_err(|e| format!("invalid --admin '{}': {}", admin, e))?;
    if engine.is_zero() || admin.is_zero() {
        return Err("engine and administrator addresses must not be zero".into());
    }

    GovernorConfig::create_default(output, &engine, &admin)?;
    println!("Wrote {}", output.display());
    Ok(())
}
