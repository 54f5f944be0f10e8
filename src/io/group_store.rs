use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use rust_xlsxwriter::Workbook;
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::io::sheet::{self, RawSheet};
use crate::model::{CanonicalField, VmRecord};
use crate::units::Gigabytes;

/// Sheet holding the records of a staged group.
pub const GROUP_SHEET: &str = "Group";
/// Leading column carrying the row position within the group.
pub const INDEX_COLUMN: &str = "index";

/// Staging area between grouping and payload assembly. Each group is written
/// once under its artifact name and read back once.
pub trait GroupStore {
    fn write_group(&mut self, name: &str, records: &[VmRecord]) -> Result<()>;

    /// Loads a staged group. Fails with [`ToolError::ArtifactRead`] when the
    /// artifact is missing or unreadable.
    fn read_group(&self, name: &str) -> Result<Vec<VmRecord>>;
}

/// Keeps staged groups in process.
#[derive(Debug, Default, Clone)]
pub struct MemoryGroupStore {
    groups: BTreeMap<String, Vec<VmRecord>>,
}

impl GroupStore for MemoryGroupStore {
    fn write_group(&mut self, name: &str, records: &[VmRecord]) -> Result<()> {
        self.groups.insert(name.to_string(), records.to_vec());
        Ok(())
    }

    fn read_group(&self, name: &str) -> Result<Vec<VmRecord>> {
        self.groups
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::ArtifactRead {
                name: name.to_string(),
                reason: "no such group".to_string(),
            })
    }
}

/// Stages each group as `<name>.xlsx` inside a directory.
#[derive(Debug, Clone)]
pub struct XlsxGroupStore {
    dir: PathBuf,
}

impl XlsxGroupStore {
    /// Opens the staging directory, creating it when needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.xlsx"))
    }
}

impl GroupStore for XlsxGroupStore {
    fn write_group(&mut self, name: &str, records: &[VmRecord]) -> Result<()> {
        let path = self.artifact_path(name);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(GROUP_SHEET)?;

        worksheet.write_string(0, 0, INDEX_COLUMN)?;
        for (col_idx, field) in CanonicalField::ALL.iter().enumerate() {
            worksheet.write_string(0, (col_idx + 1) as u16, field.name())?;
        }

        for (row_idx, record) in records.iter().enumerate() {
            let row = (row_idx + 1) as u32;
            worksheet.write_number(row, 0, row_idx as f64)?;
            for (col_idx, field) in CanonicalField::ALL.iter().enumerate() {
                let col = (col_idx + 1) as u16;
                match field_value(record, *field) {
                    FieldValue::Number(value) => {
                        worksheet.write_number(row, col, value)?;
                    }
                    FieldValue::Text(value) if !value.is_empty() => {
                        worksheet.write_string(row, col, value)?;
                    }
                    FieldValue::Text(_) => {}
                }
            }
        }

        workbook.save(&path)?;
        debug!(path = %path.display(), vm_count = records.len(), "group artifact written");
        Ok(())
    }

    fn read_group(&self, name: &str) -> Result<Vec<VmRecord>> {
        let path = self.artifact_path(name);
        let failure = |reason: String| ToolError::ArtifactRead {
            name: name.to_string(),
            reason,
        };

        if !path.is_file() {
            return Err(failure(format!("{} does not exist", path.display())));
        }
        let sheet =
            sheet::read_sheet(&path, GROUP_SHEET).map_err(|error| failure(error.to_string()))?;
        records_from_sheet(&sheet).map_err(failure)
    }
}

enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

fn field_value(record: &VmRecord, field: CanonicalField) -> FieldValue<'_> {
    match field {
        CanonicalField::VmId => FieldValue::Text(&record.vm_id),
        CanonicalField::VmName => FieldValue::Text(&record.vm_name),
        CanonicalField::Os => FieldValue::Text(record.os.as_deref().unwrap_or_default()),
        CanonicalField::OsName => FieldValue::Text(record.os_name.as_deref().unwrap_or_default()),
        CanonicalField::VmState => FieldValue::Text(&record.vm_state),
        CanonicalField::VCpu => FieldValue::Number(f64::from(record.v_cpu)),
        CanonicalField::VRam => FieldValue::Number(record.v_ram.value()),
        CanonicalField::VmdkTotal => FieldValue::Number(record.vmdk_total.value()),
        CanonicalField::VmdkUsed => FieldValue::Number(record.vmdk_used.value()),
        CanonicalField::IpAddresses => FieldValue::Text(&record.ip_addresses),
        CanonicalField::Cluster => FieldValue::Text(&record.cluster),
        CanonicalField::VirtualDatacenter => FieldValue::Text(&record.virtual_datacenter),
        CanonicalField::VmFolder => {
            FieldValue::Text(record.vm_folder.as_deref().unwrap_or_default())
        }
        CanonicalField::ResourcePool => {
            FieldValue::Text(record.resource_pool.as_deref().unwrap_or_default())
        }
    }
}

/// Rebuilds records from a staged sheet. Errors are plain messages, wrapped
/// into [`ToolError::ArtifactRead`] by the caller.
fn records_from_sheet(sheet: &RawSheet) -> std::result::Result<Vec<VmRecord>, String> {
    let mut columns = BTreeMap::new();
    let mut missing = Vec::new();
    for field in CanonicalField::ALL {
        match sheet.column_index(field.name()) {
            Some(index) => {
                columns.insert(field, index);
            }
            None => missing.push(field.name()),
        }
    }
    if !missing.is_empty() {
        return Err(format!("missing columns {missing:?}"));
    }

    (0..sheet.rows.len())
        .map(|row| -> std::result::Result<VmRecord, String> {
            let text = |field: CanonicalField| sheet.cell(row, columns[&field]).to_text();
            let optional = |field: CanonicalField| Some(text(field)).filter(|v| !v.is_empty());
            let number = |field: CanonicalField| {
                let cell = sheet.cell(row, columns[&field]);
                cell.to_number().ok_or_else(|| {
                    format!(
                        "row {}: invalid {} value '{}'",
                        row + 2,
                        field.name(),
                        cell.to_text()
                    )
                })
            };

            Ok(VmRecord {
                vm_id: text(CanonicalField::VmId),
                vm_name: text(CanonicalField::VmName),
                os: optional(CanonicalField::Os),
                os_name: optional(CanonicalField::OsName),
                vm_state: text(CanonicalField::VmState),
                v_cpu: number(CanonicalField::VCpu)? as u32,
                v_ram: Gigabytes(number(CanonicalField::VRam)?),
                vmdk_total: Gigabytes(number(CanonicalField::VmdkTotal)?),
                vmdk_used: Gigabytes(number(CanonicalField::VmdkUsed)?),
                ip_addresses: text(CanonicalField::IpAddresses),
                cluster: text(CanonicalField::Cluster),
                virtual_datacenter: text(CanonicalField::VirtualDatacenter),
                vm_folder: optional(CanonicalField::VmFolder),
                resource_pool: optional(CanonicalField::ResourcePool),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(name: &str, pool: Option<&str>) -> VmRecord {
        VmRecord {
            vm_id: "4201".into(),
            vm_name: name.to_string(),
            os: Some("Red Hat Enterprise Linux 8".into()),
            os_name: None,
            vm_state: "poweredOn".into(),
            v_cpu: 6,
            v_ram: Gigabytes(7.5),
            vmdk_total: Gigabytes(120.25),
            vmdk_used: Gigabytes(0.0),
            ip_addresses: "10.1.1.1, 10.1.1.2".into(),
            cluster: "C1".into(),
            virtual_datacenter: "DC1".into(),
            vm_folder: None,
            resource_pool: pool.map(str::to_string),
        }
    }

    #[test]
    fn xlsx_store_restores_staged_records() {
        let temp_dir = tempdir().expect("temporary directory");
        let mut store = XlsxGroupStore::create(temp_dir.path().join("staging"))
            .expect("staging directory");
        let records = vec![record("web01", Some("Prod")), record("web02", None)];

        store.write_group("rp_Prod", &records).expect("group written");
        assert!(store.artifact_path("rp_Prod").is_file());

        let restored = store.read_group("rp_Prod").expect("group read");
        assert_eq!(restored, records);
    }

    #[test]
    fn xlsx_store_reads_back_empty_group() {
        let temp_dir = tempdir().expect("temporary directory");
        let mut store = XlsxGroupStore::create(temp_dir.path()).expect("staging directory");
        store.write_group("cluster_empty", &[]).expect("group written");
        assert_eq!(store.read_group("cluster_empty").expect("group read"), Vec::new());
    }

    #[test]
    fn missing_artifact_is_a_read_failure() {
        let temp_dir = tempdir().expect("temporary directory");
        let store = XlsxGroupStore::create(temp_dir.path()).expect("staging directory");
        let error = store.read_group("cluster_gone").expect_err("missing artifact");
        assert!(matches!(error, ToolError::ArtifactRead { ref name, .. } if name == "cluster_gone"));
    }

    #[test]
    fn memory_store_round_trips_and_reports_missing_groups() {
        let mut store = MemoryGroupStore::default();
        store
            .write_group("vdc_DC1", &[record("a", None)])
            .expect("group written");
        assert_eq!(store.read_group("vdc_DC1").expect("group read").len(), 1);
        assert!(matches!(
            store.read_group("vdc_DC2"),
            Err(ToolError::ArtifactRead { .. })
        ));
    }
}
