//! Normalisation of inventory exports into [`VmRecord`]s.
//!
//! Each supported export is described by a [`FormatSchema`]: the sheet to
//! read, a table of source columns and the canonical field each one feeds,
//! and any derived fields built from several source columns. A single engine,
//! [`map_sheet`], applies a schema to a sheet. Columns not named by the
//! schema are ignored.

use std::collections::BTreeMap;

use crate::error::{Result, ToolError};
use crate::io::sheet::{Cell, RawSheet};
use crate::model::{CanonicalField, VmRecord};
use crate::units::Megabytes;

/// One source column and the canonical field it is renamed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub source: &'static str,
    pub field: CanonicalField,
    pub required: bool,
}

const fn required(source: &'static str, field: CanonicalField) -> ColumnSpec {
    ColumnSpec {
        source,
        field,
        required: true,
    }
}

const fn optional(source: &'static str, field: CanonicalField) -> ColumnSpec {
    ColumnSpec {
        source,
        field,
        required: false,
    }
}

/// Canonical field computed from several source columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Joins the non-blank values of `sources`, in order, with `separator`.
    /// Absent source columns count as blank.
    JoinNonBlank {
        sources: &'static [&'static str],
        field: CanonicalField,
        separator: &'static str,
    },
}

/// Declarative description of an inventory export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSchema {
    pub sheet: &'static str,
    pub columns: &'static [ColumnSpec],
    pub derived: &'static [Derivation],
}

/// Inventory exports understood by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Live Optics export, `VMs` sheet.
    LiveOptics,
    /// RVTools export, `vInfo` sheet.
    RvTools,
}

impl SourceFormat {
    pub fn schema(self) -> &'static FormatSchema {
        match self {
            SourceFormat::LiveOptics => &LIVE_OPTICS,
            SourceFormat::RvTools => &RV_TOOLS,
        }
    }

    pub fn sheet_name(self) -> &'static str {
        self.schema().sheet
    }
}

pub static LIVE_OPTICS: FormatSchema = FormatSchema {
    sheet: "VMs",
    columns: &[
        required("MOB ID", CanonicalField::VmId),
        required("VM Name", CanonicalField::VmName),
        optional("VM OS", CanonicalField::Os),
        optional("Guest Hostname", CanonicalField::OsName),
        optional("IsRunning", CanonicalField::VmState),
        required("Virtual CPU", CanonicalField::VCpu),
        required("Provisioned Memory (MB)", CanonicalField::VRam),
        required("Virtual Disk Size (MB)", CanonicalField::VmdkTotal),
        required("Virtual Disk Used (MB)", CanonicalField::VmdkUsed),
        required("Cluster", CanonicalField::Cluster),
        required("Datacenter", CanonicalField::VirtualDatacenter),
    ],
    derived: &[Derivation::JoinNonBlank {
        sources: &["Guest IP1", "Guest IP2", "Guest IP3", "Guest IP4"],
        field: CanonicalField::IpAddresses,
        separator: ", ",
    }],
};

pub static RV_TOOLS: FormatSchema = FormatSchema {
    sheet: "vInfo",
    columns: &[
        required("VM ID", CanonicalField::VmId),
        required("VM", CanonicalField::VmName),
        optional("OS according to the VMware Tools", CanonicalField::Os),
        optional("DNS Name", CanonicalField::OsName),
        optional("Powerstate", CanonicalField::VmState),
        required("CPUs", CanonicalField::VCpu),
        required("Memory", CanonicalField::VRam),
        required("Provisioned MB", CanonicalField::VmdkTotal),
        required("In Use MB", CanonicalField::VmdkUsed),
        optional("Primary IP Address", CanonicalField::IpAddresses),
        optional("Folder", CanonicalField::VmFolder),
        optional("Resource pool", CanonicalField::ResourcePool),
        required("Cluster", CanonicalField::Cluster),
        required("Datacenter", CanonicalField::VirtualDatacenter),
    ],
    derived: &[],
};

/// Source column positions resolved against one sheet's header row.
struct ResolvedSchema {
    columns: BTreeMap<CanonicalField, (usize, &'static str)>,
    derived: Vec<(CanonicalField, Vec<usize>, &'static str)>,
}

impl ResolvedSchema {
    fn resolve(
        schema: &FormatSchema,
        sheet: &RawSheet,
        also_required: &[CanonicalField],
    ) -> Result<Self> {
        let mut columns = BTreeMap::new();
        let mut missing = Vec::new();

        for spec in schema.columns {
            let required = spec.required || also_required.contains(&spec.field);
            match sheet.column_index(spec.source) {
                Some(index) => {
                    columns.insert(spec.field, (index, spec.source));
                }
                None if required => missing.push(spec.source.to_string()),
                None => {}
            }
        }

        if !missing.is_empty() {
            return Err(ToolError::MissingColumns {
                sheet: sheet.name.clone(),
                columns: missing,
            });
        }

        let derived = schema
            .derived
            .iter()
            .map(|derivation| match derivation {
                Derivation::JoinNonBlank {
                    sources,
                    field,
                    separator,
                } => {
                    let indices: Vec<usize> = sources
                        .iter()
                        .filter_map(|source| sheet.column_index(source))
                        .collect();
                    (*field, indices, *separator)
                }
            })
            .collect();

        Ok(Self { columns, derived })
    }
}

/// Validates `sheet` against `schema` and maps every row to a
/// record, preserving row order. Sizes stay in megabytes.
pub fn map_sheet(sheet: &RawSheet, schema: &FormatSchema) -> Result<Vec<VmRecord<Megabytes>>> {
    map_sheet_requiring(sheet, schema, &[])
}

/// Like [`map_sheet`], but optional columns feeding `also_required` must be
/// present too. Fields the schema does not map at all are left absent.
pub fn map_sheet_requiring(
    sheet: &RawSheet,
    schema: &FormatSchema,
    also_required: &[CanonicalField],
) -> Result<Vec<VmRecord<Megabytes>>> {
    let resolved = ResolvedSchema::resolve(schema, sheet, also_required)?;
    (0..sheet.rows.len())
        .map(|row| {
            RowReader {
                sheet,
                row,
                schema: &resolved,
            }
            .into_record()
        })
        .collect()
}

struct RowReader<'a> {
    sheet: &'a RawSheet,
    row: usize,
    schema: &'a ResolvedSchema,
}

impl RowReader<'_> {
    fn into_record(self) -> Result<VmRecord<Megabytes>> {
        Ok(VmRecord {
            vm_id: self.text(CanonicalField::VmId),
            vm_name: self.text(CanonicalField::VmName),
            os: self.optional_text(CanonicalField::Os),
            os_name: self.optional_text(CanonicalField::OsName),
            vm_state: self.text(CanonicalField::VmState),
            v_cpu: self.count(CanonicalField::VCpu)?,
            v_ram: Megabytes(self.number(CanonicalField::VRam)?),
            vmdk_total: Megabytes(self.number(CanonicalField::VmdkTotal)?),
            vmdk_used: Megabytes(self.number(CanonicalField::VmdkUsed)?),
            ip_addresses: self.text(CanonicalField::IpAddresses),
            cluster: self.text(CanonicalField::Cluster),
            virtual_datacenter: self.text(CanonicalField::VirtualDatacenter),
            vm_folder: self.optional_text(CanonicalField::VmFolder),
            resource_pool: self.optional_text(CanonicalField::ResourcePool),
        })
    }

    fn text(&self, field: CanonicalField) -> String {
        if let Some(&(index, _)) = self.schema.columns.get(&field) {
            return self.sheet.cell(self.row, index).to_text();
        }
        self.schema
            .derived
            .iter()
            .find(|(target, _, _)| *target == field)
            .map(|(_, indices, separator)| {
                indices
                    .iter()
                    .map(|&index| self.sheet.cell(self.row, index))
                    .filter(|cell| !cell.is_blank())
                    .map(Cell::to_text)
                    .collect::<Vec<_>>()
                    .join(*separator)
            })
            .unwrap_or_default()
    }

    fn optional_text(&self, field: CanonicalField) -> Option<String> {
        let value = self.text(field);
        if value.is_empty() { None } else { Some(value) }
    }

    fn number(&self, field: CanonicalField) -> Result<f64> {
        let Some(&(index, source)) = self.schema.columns.get(&field) else {
            return Err(self.coercion_error(field.name(), String::new()));
        };
        let cell = self.sheet.cell(self.row, index);
        cell.to_number()
            .filter(|value| value.is_finite())
            .ok_or_else(|| self.coercion_error(source, cell.to_text()))
    }

    fn count(&self, field: CanonicalField) -> Result<u32> {
        let value = self.number(field)?;
        if value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
            Ok(value as u32)
        } else {
            let column = self
                .schema
                .columns
                .get(&field)
                .map_or(field.name(), |&(_, source)| source);
            Err(self.coercion_error(column, value.to_string()))
        }
    }

    fn coercion_error(&self, column: &str, value: String) -> ToolError {
        ToolError::NumericCoercion {
            sheet: self.sheet.name.clone(),
            // Spreadsheet numbering: header is row 1.
            row: self.row + 2,
            column: column.to_string(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    fn live_optics_sheet(rows: Vec<Vec<Cell>>) -> RawSheet {
        let headers = [
            "MOB ID",
            "VM Name",
            "VM OS",
            "Guest Hostname",
            "IsRunning",
            "Virtual CPU",
            "Provisioned Memory (MB)",
            "Consumed Memory (MB)",
            "Virtual Disk Size (MB)",
            "Virtual Disk Used (MB)",
            "Guest IP1",
            "Guest IP2",
            "Guest IP3",
            "Guest IP4",
            "Cluster",
            "Datacenter",
            "Host",
        ];
        RawSheet::new(
            "VMs",
            headers.iter().map(|h| h.to_string()).collect(),
            rows,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn live_optics_row(
        id: &str,
        name: &str,
        cpu: f64,
        ram_mb: f64,
        disk_mb: f64,
        used_mb: f64,
        ips: [&str; 4],
        cluster: &str,
    ) -> Vec<Cell> {
        let mut row = vec![
            text(id),
            text(name),
            text("Ubuntu Linux (64-bit)"),
            Cell::Empty,
            Cell::Bool(true),
            Cell::Number(cpu),
            Cell::Number(ram_mb),
            Cell::Number(ram_mb / 2.0),
            Cell::Number(disk_mb),
            Cell::Number(used_mb),
        ];
        row.extend(ips.iter().map(|ip| {
            if ip.is_empty() {
                Cell::Empty
            } else {
                text(ip)
            }
        }));
        row.extend([text(cluster), text("DC1"), text("esx01")]);
        row
    }

    #[test]
    fn live_optics_rows_are_renamed_and_ips_merged() {
        let sheet = live_optics_sheet(vec![
            live_optics_row(
                "vm-1",
                "web01",
                2.0,
                2048.0,
                102400.0,
                51200.0,
                ["10.0.0.1", "", "", ""],
                "C1",
            ),
            live_optics_row(
                "vm-2",
                "db01",
                8.0,
                4096.0,
                204800.0,
                1024.0,
                ["", "10.0.0.2", "", "fe80::1"],
                "C2",
            ),
        ]);

        let records = map_sheet(&sheet, &LIVE_OPTICS).expect("sheet mapped");
        assert_eq!(records.len(), 2);

        let web = &records[0];
        assert_eq!(web.vm_id, "vm-1");
        assert_eq!(web.vm_name, "web01");
        assert_eq!(web.os.as_deref(), Some("Ubuntu Linux (64-bit)"));
        assert_eq!(web.os_name, None);
        assert_eq!(web.vm_state, "true");
        assert_eq!(web.v_cpu, 2);
        assert_eq!(web.v_ram, Megabytes(2048.0));
        assert_eq!(web.vmdk_total, Megabytes(102400.0));
        assert_eq!(web.ip_addresses, "10.0.0.1");
        assert_eq!(web.cluster, "C1");
        assert_eq!(web.virtual_datacenter, "DC1");
        assert_eq!(web.vm_folder, None);
        assert_eq!(web.resource_pool, None);

        assert_eq!(records[1].ip_addresses, "10.0.0.2, fe80::1");
        assert_eq!(records[1].vm_name, "db01");
    }

    #[test]
    fn row_without_any_ip_gets_empty_addresses() {
        let sheet = live_optics_sheet(vec![live_optics_row(
            "vm-3",
            "batch",
            1.0,
            1024.0,
            1024.0,
            0.0,
            ["", "", "", ""],
            "C1",
        )]);
        let records = map_sheet(&sheet, &LIVE_OPTICS).expect("sheet mapped");
        assert_eq!(records[0].ip_addresses, "");
    }

    #[test]
    fn every_missing_required_column_is_reported() {
        let sheet = RawSheet::new(
            "VMs",
            vec!["MOB ID".into(), "VM Name".into(), "Cluster".into()],
            Vec::new(),
        );
        let error = map_sheet(&sheet, &LIVE_OPTICS).expect_err("schema mismatch");
        match error {
            ToolError::MissingColumns { sheet, columns } => {
                assert_eq!(sheet, "VMs");
                assert_eq!(
                    columns,
                    vec![
                        "Virtual CPU",
                        "Provisioned Memory (MB)",
                        "Virtual Disk Size (MB)",
                        "Virtual Disk Used (MB)",
                        "Datacenter",
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_size_is_rejected_with_location() {
        let mut row = live_optics_row(
            "vm-1",
            "web01",
            2.0,
            2048.0,
            1.0,
            1.0,
            ["", "", "", ""],
            "C1",
        );
        row[6] = text("lots");
        let sheet = live_optics_sheet(vec![row]);

        let error = map_sheet(&sheet, &LIVE_OPTICS).expect_err("coercion failure");
        match error {
            ToolError::NumericCoercion {
                row, column, value, ..
            } => {
                assert_eq!(row, 2);
                assert_eq!(column, "Provisioned Memory (MB)");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fractional_cpu_count_is_rejected() {
        let sheet = live_optics_sheet(vec![live_optics_row(
            "vm-1",
            "web01",
            1.5,
            2048.0,
            1.0,
            1.0,
            ["", "", "", ""],
            "C1",
        )]);
        assert!(matches!(
            map_sheet(&sheet, &LIVE_OPTICS),
            Err(ToolError::NumericCoercion { .. })
        ));
    }

    #[test]
    fn rv_tools_keeps_folder_and_resource_pool() {
        let headers = [
            "VM",
            "Powerstate",
            "CPUs",
            "Memory",
            "Provisioned MB",
            "In Use MB",
            "Primary IP Address",
            "DNS Name",
            "OS according to the VMware Tools",
            "Folder",
            "Resource pool",
            "Cluster",
            "Datacenter",
            "VM ID",
            "Annotation",
        ];
        let sheet = RawSheet::new(
            "vInfo",
            headers.iter().map(|h| h.to_string()).collect(),
            vec![
                vec![
                    text("app01"),
                    text("poweredOn"),
                    Cell::Number(4.0),
                    Cell::Number(8192.0),
                    text("40960"),
                    Cell::Number(20480.5),
                    text("192.168.1.10"),
                    text("app01.corp"),
                    text("Microsoft Windows Server 2019"),
                    text("/Prod/Apps"),
                    Cell::Empty,
                    text("C1"),
                    text("DC1"),
                    text("vm-101"),
                    text("ignored"),
                ],
            ],
        );

        let records = map_sheet(&sheet, &RV_TOOLS).expect("sheet mapped");
        assert_eq!(records.len(), 1);
        let app = &records[0];
        assert_eq!(app.vm_id, "vm-101");
        assert_eq!(app.vm_state, "poweredOn");
        assert_eq!(app.vmdk_total, Megabytes(40960.0));
        assert_eq!(app.vmdk_used, Megabytes(20480.5));
        assert_eq!(app.ip_addresses, "192.168.1.10");
        assert_eq!(app.os_name.as_deref(), Some("app01.corp"));
        assert_eq!(app.vm_folder.as_deref(), Some("/Prod/Apps"));
        assert_eq!(app.resource_pool, None);
    }

    #[test]
    fn grouping_columns_are_only_required_on_request() {
        let sheet = RawSheet::new(
            "vInfo",
            ["VM ID", "VM", "CPUs", "Memory", "Provisioned MB", "In Use MB", "Cluster", "Datacenter"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            vec![vec![
                text("vm-7"),
                text("batch01"),
                Cell::Number(2.0),
                Cell::Number(1024.0),
                Cell::Number(10240.0),
                Cell::Number(512.0),
                text("C1"),
                text("DC1"),
            ]],
        );

        let records = map_sheet(&sheet, &RV_TOOLS).expect("sheet mapped");
        assert_eq!(records[0].vm_folder, None);
        assert_eq!(records[0].resource_pool, None);

        let error = map_sheet_requiring(&sheet, &RV_TOOLS, &[CanonicalField::ResourcePool])
            .expect_err("pool column required");
        match error {
            ToolError::MissingColumns { columns, .. } => assert_eq!(columns, ["Resource pool"]),
            other => panic!("unexpected error: {other}"),
        }

        let live_optics = live_optics_sheet(vec![live_optics_row(
            "vm-1",
            "web01",
            2.0,
            2048.0,
            1.0,
            1.0,
            ["", "", "", ""],
            "C1",
        )]);
        let unmapped = map_sheet_requiring(&live_optics, &LIVE_OPTICS, &[CanonicalField::VmFolder])
            .expect("folder has no source column");
        assert_eq!(unmapped[0].vm_folder, None);
    }

    #[test]
    fn format_sheet_names() {
        assert_eq!(SourceFormat::LiveOptics.sheet_name(), "VMs");
        assert_eq!(SourceFormat::RvTools.sheet_name(), "vInfo");
    }
}
