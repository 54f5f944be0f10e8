//! Partitioning of VM records into workload groups.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use tracing::{debug, info, instrument};

use crate::error::{Result, ToolError};
use crate::io::group_store::GroupStore;
use crate::model::{CanonicalField, VmRecord};

/// Record attribute used to split the inventory into workload profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupingDimension {
    Clusters,
    VirtualDatacenter,
    ResourcePools,
    Folders,
}

impl GroupingDimension {
    pub const ALL: [GroupingDimension; 4] = [
        GroupingDimension::Clusters,
        GroupingDimension::VirtualDatacenter,
        GroupingDimension::ResourcePools,
        GroupingDimension::Folders,
    ];

    /// Selector accepted on the command line.
    pub fn selector(self) -> &'static str {
        match self {
            GroupingDimension::Clusters => "clusters",
            GroupingDimension::VirtualDatacenter => "virtual datacenter",
            GroupingDimension::ResourcePools => "resource pools",
            GroupingDimension::Folders => "folders",
        }
    }

    /// Prefix of every artifact name produced for this dimension.
    pub fn prefix(self) -> &'static str {
        match self {
            GroupingDimension::Clusters => "cluster_",
            GroupingDimension::VirtualDatacenter => "vdc_",
            GroupingDimension::ResourcePools => "rp_",
            GroupingDimension::Folders => "vmfolder_",
        }
    }

    /// Canonical field holding the group key.
    pub fn field(self) -> CanonicalField {
        match self {
            GroupingDimension::Clusters => CanonicalField::Cluster,
            GroupingDimension::VirtualDatacenter => CanonicalField::VirtualDatacenter,
            GroupingDimension::ResourcePools => CanonicalField::ResourcePool,
            GroupingDimension::Folders => CanonicalField::VmFolder,
        }
    }

    /// Group key of a record. Absent values group under the empty string.
    pub fn key(self, record: &VmRecord) -> &str {
        match self {
            GroupingDimension::Clusters => &record.cluster,
            GroupingDimension::VirtualDatacenter => &record.virtual_datacenter,
            GroupingDimension::ResourcePools => record.resource_pool.as_deref().unwrap_or(""),
            GroupingDimension::Folders => record.vm_folder.as_deref().unwrap_or(""),
        }
    }

    /// Artifact name for a group key, see [`escape_key`].
    pub fn artifact_name(self, key: &str) -> String {
        format!("{}{}", self.prefix(), escape_key(key))
    }
}

impl FromStr for GroupingDimension {
    type Err = ToolError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|dimension| dimension.selector() == normalized)
            .ok_or_else(|| ToolError::UnrecognizedGroupingDimension(value.to_string()))
    }
}

impl fmt::Display for GroupingDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Makes a group key safe to use as a file name.
///
/// ASCII letters, digits, `-`, `_` and `.` are kept. Every other byte,
/// including `%`, becomes `%XX`. Distinct keys therefore never share a name.
pub fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
            escaped.push(char::from(byte));
        } else {
            let _ = write!(escaped, "%{byte:02X}");
        }
    }
    escaped
}

/// Longest artifact name handed to a store, in bytes. Leaves room for a file
/// extension under the common 255-byte file name limit.
pub const MAX_ARTIFACT_NAME_BYTES: usize = 200;

/// Tracks the artifact names handed out during one run.
///
/// Names are compared case-folded so two groups never land on the same file
/// of a case-insensitive file system. Over-long names are cut back to
/// [`MAX_ARTIFACT_NAME_BYTES`]. A clash gets a `~N` counter suffix; `~` is
/// always escaped inside keys, so suffixed names cannot collide with plain ones.
#[derive(Debug, Default)]
pub struct ArtifactNameRegistry {
    used: HashSet<String>,
}

impl ArtifactNameRegistry {
    /// Returns a unique artifact name for `key` under `dimension`.
    pub fn assign(&mut self, dimension: GroupingDimension, key: &str) -> String {
        let full = dimension.artifact_name(key);
        let base = truncate_escaped(&full, MAX_ARTIFACT_NAME_BYTES);
        if self.claim(base) {
            return base.to_string();
        }

        let mut counter = 1;
        loop {
            let suffix = format!("~{counter}");
            let prefix_len = MAX_ARTIFACT_NAME_BYTES.saturating_sub(suffix.len());
            let candidate = format!("{}{}", truncate_escaped(base, prefix_len), suffix);
            if self.claim(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    fn claim(&mut self, name: &str) -> bool {
        self.used.insert(name.to_ascii_lowercase())
    }
}

/// Cuts an escaped name to at most `limit` bytes without splitting a `%XX`.
fn truncate_escaped(name: &str, limit: usize) -> &str {
    if name.len() <= limit {
        return name;
    }
    let bytes = name.as_bytes();
    let mut end = limit;
    if end >= 1 && bytes[end - 1] == b'%' {
        end -= 1;
    } else if end >= 2 && bytes[end - 2] == b'%' {
        end -= 2;
    }
    &name[..end]
}

/// Records sharing one value of the grouping dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    pub name: String,
    pub key: String,
    pub records: Vec<VmRecord>,
}

/// Splits `records` by `dimension`. Groups come out in ascending key order
/// and records keep their input order within a group.
pub fn partition(records: &[VmRecord], dimension: GroupingDimension) -> Vec<RecordGroup> {
    let mut groups: BTreeMap<&str, Vec<VmRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(dimension.key(record))
            .or_default()
            .push(record.clone());
    }

    let mut registry = ArtifactNameRegistry::default();
    groups
        .into_iter()
        .map(|(key, records)| RecordGroup {
            name: registry.assign(dimension, key),
            key: key.to_string(),
            records,
        })
        .collect()
}

/// Partitions `records` and writes one artifact per group into `store`.
/// Returns the artifact names in group order.
#[instrument(level = "info", skip(records, store), fields(record_count = records.len(), %dimension))]
pub fn stage_groups<S: GroupStore + ?Sized>(
    records: &[VmRecord],
    dimension: GroupingDimension,
    store: &mut S,
) -> Result<Vec<String>> {
    let groups = partition(records, dimension);
    info!(group_count = groups.len(), "partitioned inventory");

    let mut names = Vec::with_capacity(groups.len());
    for group in groups {
        debug!(name = %group.name, vm_count = group.records.len(), "staging group");
        store.write_group(&group.name, &group.records)?;
        names.push(group.name);
    }
    Ok(names)
}
