//! Assembly of the sizer request from staged workload groups.

use tracing::{debug, info, instrument};

use crate::error::{Result, ToolError};
use crate::io::group_store::GroupStore;
use crate::model::{
    SizerConfiguration, SizerRequest, VmComputeInfo, VmInfo, VmMemoryInfo, VmRecord,
    VmStorageInfo, WorkloadProfile,
};

/// Sizes beyond 2^53 are no longer whole-number exact in `f64`.
const MAX_WHOLE: f64 = 9_007_199_254_740_992.0;

/// Builds [`SizerRequest`]s around one fixed configuration.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    configuration: SizerConfiguration,
}

impl PayloadBuilder {
    pub fn new(configuration: SizerConfiguration) -> Self {
        Self { configuration }
    }

    /// Reads every staged group named in `names` and turns each into one
    /// workload profile, in the given order. Nothing is returned unless every
    /// group loads and converts.
    #[instrument(level = "info", skip_all, fields(group_count = names.len()))]
    pub fn build<S: GroupStore + ?Sized>(&self, names: &[String], store: &S) -> Result<SizerRequest> {
        let workload_profiles = names
            .iter()
            .map(|name| {
                let records = store.read_group(name)?;
                debug!(%name, vm_count = records.len(), "loaded group");
                build_profile(name, &records)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            profile_count = workload_profiles.len(),
            vm_count = workload_profiles.iter().map(|p| p.vm_list.len()).sum::<usize>(),
            "assembled sizer request"
        );
        Ok(SizerRequest {
            configurations: self.configuration.clone(),
            workload_profiles,
        })
    }
}

/// Builds an enabled profile holding one entry per record.
pub fn build_profile(name: &str, records: &[VmRecord]) -> Result<WorkloadProfile> {
    let vm_list = records
        .iter()
        .enumerate()
        .map(|(row, record)| vm_info(name, row, record))
        .collect::<Result<Vec<_>>>()?;

    Ok(WorkloadProfile {
        profile_name: name.to_string(),
        separate_cluster: true,
        is_enabled: true,
        vm_list,
    })
}

fn vm_info(profile: &str, row: usize, record: &VmRecord) -> Result<VmInfo> {
    let whole = |column: &str, value: f64| {
        truncate(value).ok_or_else(|| ToolError::NumericCoercion {
            sheet: profile.to_string(),
            row: row + 2,
            column: column.to_string(),
            value: value.to_string(),
        })
    };

    Ok(VmInfo {
        vm_id: record.vm_id.clone(),
        vm_name: record.vm_name.clone(),
        vm_compute_info: VmComputeInfo {
            v_cpu: i64::from(record.v_cpu),
        },
        vm_memory_info: VmMemoryInfo {
            v_ram: whole("vRam", record.v_ram.value())?,
        },
        vm_storage_info: VmStorageInfo {
            vmdk_total: whole("vmdkTotal", record.vmdk_total.value())?,
            vmdk_used: whole("vmdkUsed", record.vmdk_used.value())?,
        },
    })
}

/// Drops the fractional part, rounding toward zero. Sizes below one
/// gigabyte become `0`. Non-finite or out of range values yield `None`.
pub fn truncate(value: f64) -> Option<i64> {
    if value.is_finite() && value.abs() <= MAX_WHOLE {
        Some(value.trunc() as i64)
    } else {
        None
    }
}
