use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::units::Gigabytes;

/// Canonical description of a single virtual machine, independent of the
/// export it was read from.
///
/// The unit parameter tracks whether `v_ram` and the VMDK sizes are still in
/// the megabytes of the source export or have been normalised to gigabytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmRecord<U = Gigabytes> {
    pub vm_id: String,
    pub vm_name: String,
    pub os: Option<String>,
    pub os_name: Option<String>,
    /// Power state as reported by the export (`true`, `poweredOn`, ...).
    pub vm_state: String,
    pub v_cpu: u32,
    pub v_ram: U,
    /// Provisioned disk capacity.
    pub vmdk_total: U,
    /// Consumed disk capacity. Not guaranteed to be below `vmdk_total`.
    pub vmdk_used: U,
    /// Comma separated guest addresses; empty when none are known.
    pub ip_addresses: String,
    pub cluster: String,
    pub virtual_datacenter: String,
    pub vm_folder: Option<String>,
    pub resource_pool: Option<String>,
}

/// Columns of the canonical record, in the order used for staged artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalField {
    VmId,
    VmName,
    Os,
    OsName,
    VmState,
    VCpu,
    VRam,
    VmdkTotal,
    VmdkUsed,
    IpAddresses,
    Cluster,
    VirtualDatacenter,
    VmFolder,
    ResourcePool,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 14] = [
        CanonicalField::VmId,
        CanonicalField::VmName,
        CanonicalField::Os,
        CanonicalField::OsName,
        CanonicalField::VmState,
        CanonicalField::VCpu,
        CanonicalField::VRam,
        CanonicalField::VmdkTotal,
        CanonicalField::VmdkUsed,
        CanonicalField::IpAddresses,
        CanonicalField::Cluster,
        CanonicalField::VirtualDatacenter,
        CanonicalField::VmFolder,
        CanonicalField::ResourcePool,
    ];

    /// Column header used for this field in canonical tables.
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::VmId => "vmId",
            CanonicalField::VmName => "vmName",
            CanonicalField::Os => "os",
            CanonicalField::OsName => "osName",
            CanonicalField::VmState => "vmState",
            CanonicalField::VCpu => "vCpu",
            CanonicalField::VRam => "vRam",
            CanonicalField::VmdkTotal => "vmdkTotal",
            CanonicalField::VmdkUsed => "vmdkUsed",
            CanonicalField::IpAddresses => "ipAddresses",
            CanonicalField::Cluster => "cluster",
            CanonicalField::VirtualDatacenter => "virtualDatacenter",
            CanonicalField::VmFolder => "vmFolder",
            CanonicalField::ResourcePool => "resourcePool",
        }
    }
}

/// Outlier thresholds applied by the sizer to individual VMs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VmOutlierLimits {
    pub cpu_limit: f64,
    pub storage_limit: f64,
    pub memory_limit: f64,
}

impl Default for VmOutlierLimits {
    fn default() -> Self {
        Self {
            cpu_limit: 0.75,
            storage_limit: 0.5,
            memory_limit: 0.75,
        }
    }
}

/// Sizing tunables sent with every request.
///
/// Constructed once per run and never modified afterwards. Only `cloud_type`
/// is expected to vary between runs; the remaining defaults may be
/// overridden from a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SizerConfiguration {
    pub cloud_type: String,
    pub cluster_type: String,
    #[serde(serialize_with = "whole_as_integer")]
    pub compute_overcommit_factor: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub cpu_headroom: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub hyper_threading_factor: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub memory_overcommit_factor: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub cpu_utilization: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub memory_utilization: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub storage_threshold_factor: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub compression_ratio: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub dedup_ratio: f64,
    #[serde(rename = "includeManagementVMs")]
    pub include_management_vms: bool,
    pub ftt_ftm_type: String,
    pub appliance_size: String,
    pub vm_outlier_limits: VmOutlierLimits,
    pub addons_list: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sddc_host_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_access_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_ratio: Option<f64>,
    #[serde(rename = "totalIOPs", skip_serializing_if = "Option::is_none")]
    pub total_iops: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separate_cluster: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_settings_list: Option<Value>,
}

/// Writes whole tunables as JSON integers (`4`, not `4.0`).
fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= 9_007_199_254_740_992.0 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

impl Default for SizerConfiguration {
    fn default() -> Self {
        Self {
            cloud_type: String::new(),
            cluster_type: "SAZ".to_string(),
            compute_overcommit_factor: 4.0,
            cpu_headroom: 0.15,
            hyper_threading_factor: 1.25,
            memory_overcommit_factor: 1.25,
            cpu_utilization: 1.0,
            memory_utilization: 1.0,
            storage_threshold_factor: 0.8,
            compression_ratio: 1.25,
            dedup_ratio: 1.5,
            include_management_vms: true,
            ftt_ftm_type: "AUTO_AUTO".to_string(),
            appliance_size: "AUTO".to_string(),
            vm_outlier_limits: VmOutlierLimits::default(),
            addons_list: Vec::new(),
            sddc_host_type: None,
            io_access_pattern: None,
            io_size: None,
            io_ratio: None,
            total_iops: None,
            separate_cluster: None,
            instance_settings_list: None,
        }
    }
}

impl SizerConfiguration {
    /// Default tunables for the given cloud type.
    pub fn for_cloud(cloud_type: impl Into<String>) -> Self {
        Self {
            cloud_type: cloud_type.into(),
            ..Self::default()
        }
    }

    /// Returns a copy targeting a different cloud type.
    pub fn with_cloud_type(self, cloud_type: impl Into<String>) -> Self {
        Self {
            cloud_type: cloud_type.into(),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmComputeInfo {
    pub v_cpu: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmMemoryInfo {
    pub v_ram: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmStorageInfo {
    pub vmdk_total: i64,
    pub vmdk_used: i64,
}

/// Projection of a [`VmRecord`] sent to the sizer. Sizes are whole numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmInfo {
    pub vm_id: String,
    pub vm_name: String,
    pub vm_compute_info: VmComputeInfo,
    pub vm_memory_info: VmMemoryInfo,
    pub vm_storage_info: VmStorageInfo,
}

/// Named set of VMs sized together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadProfile {
    pub profile_name: String,
    pub separate_cluster: bool,
    pub is_enabled: bool,
    pub vm_list: Vec<VmInfo>,
}

/// Root document submitted to the sizing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizerRequest {
    pub configurations: SizerConfiguration,
    pub workload_profiles: Vec<WorkloadProfile>,
}
