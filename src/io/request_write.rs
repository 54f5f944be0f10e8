use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::{SizerConfiguration, SizerRequest};

/// Writes the request as pretty-printed JSON.
pub fn write_request(path: &Path, request: &SizerRequest) -> Result<()> {
    let json_string = serde_json::to_string_pretty(request)?;
    fs::write(path, json_string)?;
    Ok(())
}

/// Loads tunables from a JSON document. Keys that are not present keep their
/// default values.
pub fn read_configuration(path: &Path) -> Result<SizerConfiguration> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
