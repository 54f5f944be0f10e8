use std::path::Path;

use tracing::{info, instrument};

use crate::error::Result;
use crate::grouping::{self, GroupingDimension};
use crate::io::group_store::{GroupStore, XlsxGroupStore};
use crate::io::inventory::read_inventory;
use crate::io::request_write::write_request;
use crate::mapping::SourceFormat;
use crate::model::{SizerConfiguration, SizerRequest};
use crate::payload::PayloadBuilder;
use crate::summary::InventorySummary;

/// Everything produced by one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub summary: InventorySummary,
    /// Staged artifact names, in profile order.
    pub artifacts: Vec<String>,
    pub request: SizerRequest,
}

/// Normalises an inventory export, stages its groups in `store`, and
/// assembles the sizer request from the staged groups.
#[instrument(
    level = "info",
    skip(store, builder),
    fields(input = %input.display(), %dimension)
)]
pub fn inventory_to_request<S: GroupStore + ?Sized>(
    input: &Path,
    format: SourceFormat,
    dimension: GroupingDimension,
    store: &mut S,
    builder: &PayloadBuilder,
) -> Result<PipelineOutput> {
    let records = read_inventory(input, format, &[dimension.field()])?;
    let summary = InventorySummary::from_records(&records);
    info!(
        vm_count = summary.vm_count,
        cluster_count = summary.cluster_count,
        "normalised inventory"
    );

    let artifacts = grouping::stage_groups(&records, dimension, store)?;
    let request = builder.build(&artifacts, store)?;
    Ok(PipelineOutput {
        summary,
        artifacts,
        request,
    })
}

/// Runs the pipeline with groups staged as workbooks under `staging_dir` and
/// writes the request JSON to `output`.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn inventory_to_request_file(
    input: &Path,
    output: &Path,
    format: SourceFormat,
    dimension: GroupingDimension,
    staging_dir: &Path,
    configuration: SizerConfiguration,
) -> Result<PipelineOutput> {
    let mut store = XlsxGroupStore::create(staging_dir)?;
    let builder = PayloadBuilder::new(configuration);
    let result = inventory_to_request(input, format, dimension, &mut store, &builder)?;
    write_request(output, &result.request)?;
    info!(
        profile_count = result.request.workload_profiles.len(),
        "sizer request written"
    );
    Ok(result)
}
