use std::path::Path;

use tracing::{debug, instrument};

use crate::error::{Result, ToolError};
use crate::io::sheet;
use crate::mapping::{self, SourceFormat};
use crate::model::{CanonicalField, VmRecord};
use crate::units;

/// Reads an inventory export and returns its VMs in canonical form with
/// sizes in gigabytes. Source columns feeding `required` must be present even
/// when the format treats them as optional.
#[instrument(level = "info", skip_all, fields(input = %path.display(), ?format))]
pub fn read_inventory(
    path: &Path,
    format: SourceFormat,
    required: &[CanonicalField],
) -> Result<Vec<VmRecord>> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    let raw = sheet::read_sheet(path, format.sheet_name())?;
    debug!(sheet = %raw.name, row_count = raw.rows.len(), "loaded inventory sheet");
    let records = mapping::map_sheet_requiring(&raw, format.schema(), required)?;
    Ok(units::normalize_records(records))
}
