use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use vm_sizer_tools::grouping::GroupingDimension;
use vm_sizer_tools::io::request_write::read_configuration;
use vm_sizer_tools::mapping::SourceFormat;
use vm_sizer_tools::model::SizerConfiguration;
use vm_sizer_tools::{Result, logging, pipeline};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose)?;
    match cli.command {
        Command::Build(args) => execute_build(args),
    }
}

fn execute_build(args: BuildArgs) -> Result<()> {
    let dimension: GroupingDimension = args.group_by.parse()?;
    let configuration = match &args.sizer_config {
        Some(path) => read_configuration(path)?,
        None => SizerConfiguration::default(),
    }
    .with_cloud_type(args.cloud_type);

    let output = pipeline::inventory_to_request_file(
        &args.input,
        &args.output,
        args.format.into(),
        dimension,
        &args.staging_dir,
        configuration,
    )?;

    if args.describe {
        println!("{}", output.summary);
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Build sizer requests from VM inventory exports."
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalise an inventory export and assemble the sizer request.
    Build(BuildArgs),
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Inventory export flavour.
    #[arg(long, value_enum)]
    format: InventoryFormat,

    /// Inventory workbook path.
    #[arg(long)]
    input: PathBuf,

    /// Grouping dimension: clusters, "virtual datacenter", "resource pools" or folders.
    #[arg(long, default_value = "clusters")]
    group_by: String,

    /// Cloud type placed in the request configuration.
    #[arg(long)]
    cloud_type: String,

    /// Destination of the request JSON.
    #[arg(long)]
    output: PathBuf,

    /// Directory receiving one workbook per workload group.
    #[arg(long, default_value = "./output")]
    staging_dir: PathBuf,

    /// Optional JSON document overriding the default sizing tunables.
    #[arg(long)]
    sizer_config: Option<PathBuf>,

    /// Print inventory totals after the request is written.
    #[arg(long)]
    describe: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum InventoryFormat {
    LiveOptics,
    RvTools,
}

impl From<InventoryFormat> for SourceFormat {
    fn from(format: InventoryFormat) -> Self {
        match format {
            InventoryFormat::LiveOptics => SourceFormat::LiveOptics,
            InventoryFormat::RvTools => SourceFormat::RvTools,
        }
    }
}
