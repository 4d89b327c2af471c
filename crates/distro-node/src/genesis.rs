//! Genesis files
//!
//! A genesis file is either a full module genesis state or a bare seed
//! list of daily totals. A seed list is paired with the node's current
//! params.

use anyhow::Context;
use std::fs;
use std::path::Path;

use distro_core::EmissionParams;
use distro_distribution::{parse_daily_totals, GenesisState};

/// Read a genesis state from `path`
pub fn load_genesis_file(path: &Path, params: &EmissionParams) -> anyhow::Result<GenesisState> {
    let content = fs::read_to_string(path).with_context(|| format!("failed to read genesis {}", path.display()))?;
    parse_genesis(&content, params).with_context(|| format!("invalid genesis {}", path.display()))
}

/// Parse either genesis form
pub fn parse_genesis(content: &str, params: &EmissionParams) -> anyhow::Result<GenesisState> {
    let genesis = if content.trim_start().starts_with('[') {
        GenesisState::new(params.clone(), parse_daily_totals(content)?)
    } else {
        GenesisState::from_json(content)?
    };
    genesis.validate()?;
    Ok(genesis)
}

/// Write `genesis` as pretty JSON
pub fn write_genesis_file(path: &Path, genesis: &GenesisState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, genesis.to_json()?).with_context(|| format!("failed to write genesis {}", path.display()))?;
    tracing::info!(path = %path.display(), totals = genesis.daily_distribution_totals.len(), "genesis exported");
    Ok(())
}
