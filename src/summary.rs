use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::model::VmRecord;

/// Totals describing a normalised inventory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub vm_count: usize,
    pub cluster_count: usize,
    pub total_v_cpu: u64,
    pub total_v_ram: f64,
    pub total_vmdk_used: f64,
    pub total_vmdk_total: f64,
}

impl InventorySummary {
    pub fn from_records(records: &[VmRecord]) -> Self {
        let clusters: BTreeSet<&str> = records.iter().map(|r| r.cluster.as_str()).collect();
        Self {
            vm_count: records.len(),
            cluster_count: clusters.len(),
            total_v_cpu: records.iter().map(|r| u64::from(r.v_cpu)).sum(),
            total_v_ram: records.iter().map(|r| r.v_ram.value()).sum(),
            total_vmdk_used: records.iter().map(|r| r.vmdk_used.value()).sum(),
            total_vmdk_total: records.iter().map(|r| r.vmdk_total.value()).sum(),
        }
    }
}

impl fmt::Display for InventorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total VM: {}", self.vm_count)?;
        writeln!(f, "Total Clusters: {}", self.cluster_count)?;
        writeln!(f, "Total vCPU: {}", self.total_v_cpu)?;
        writeln!(f, "Total vRAM (GB): {:.2}", self.total_v_ram)?;
        writeln!(f, "Total used VMDK (GB): {:.2}", self.total_vmdk_used)?;
        write!(f, "Total provisioned VMDK (GB): {:.2}", self.total_vmdk_total)
    }
}
