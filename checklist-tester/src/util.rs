use anyhow::{Context, Result};
use std::path::Path;

use checklist_core::ChecklistFixture;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Load a fixture from disk, or the bundled stock fixture when no path is given.
pub fn load_fixture(path: Option<&Path>) -> Result<ChecklistFixture> {
    let Some(path) = path else {
        return ChecklistFixture::stock().context("bundled stock fixture is invalid");
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    ChecklistFixture::from_json(&json)
        .with_context(|| format!("failed to parse fixture {}", path.display()))
}
