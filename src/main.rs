use clap::{Args, Parser, Subcommand};
use nation_risk::builder::ProfileBuilder;
use nation_risk::config::{AppConfig, BuildConfig};
use nation_risk::error::AppError;
use nation_risk::telemetry;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Nation Risk Profile Builder",
    about = "Aggregate county-level hazard and vulnerability metrics into per-nation risk profiles",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a profile for every registered nation and write the coverage report
    BuildProfiles(BuildArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Entity registry (JSON list of tracked nations)
    #[arg(long)]
    registry: PathBuf,
    /// Area-to-entity crosswalk (JSON mappings)
    #[arg(long)]
    crosswalk: PathBuf,
    /// Precomputed area-overlap weight table (JSON)
    #[arg(long)]
    area_weights: PathBuf,
    /// Coarser area-to-county relation used when overlap weights are missing
    #[arg(long)]
    area_counties: PathBuf,
    /// National risk index source table (CSV)
    #[arg(long)]
    nri: PathBuf,
    /// Social vulnerability index source table (CSV)
    #[arg(long)]
    svi: PathBuf,
    /// Optional wildfire hazard potential table applied as a category override
    #[arg(long)]
    wildfire: Option<PathBuf>,
    /// Directory receiving one profile document per nation
    #[arg(long)]
    output_dir: PathBuf,
    /// Entities processed per parallel chunk
    #[arg(long, default_value_t = 25)]
    batch_size: usize,
    /// How many top-ranked categories each source keeps
    #[arg(long, default_value_t = 5)]
    top_n: usize,
    /// Matched-county count below which coverage is reported as partial
    #[arg(long, default_value_t = 1)]
    min_counties: usize,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let app_config = AppConfig::load();
    telemetry::init(&app_config.telemetry)?;

    match cli.command {
        Command::BuildProfiles(args) => run_build(app_config, args),
    }
}

fn run_build(app_config: AppConfig, args: BuildArgs) -> Result<(), AppError> {
    let config = BuildConfig {
        registry_path: args.registry,
        crosswalk_path: args.crosswalk,
        area_weights_path: args.area_weights,
        area_counties_path: args.area_counties,
        nri_path: args.nri,
        svi_path: args.svi,
        wildfire_path: args.wildfire,
        output_dir: args.output_dir,
        batch_size: args.batch_size,
        top_n: args.top_n,
        expected_min_counties: args.min_counties,
    };
    config.validate()?;

    info!(?app_config.environment, "nation risk profile builder starting");

    let builder = ProfileBuilder::load(config)?;
    let outcome = builder.run()?;

    println!("{}", outcome.report.prose());
    println!(
        "Wrote {} profile(s); coverage report at {}",
        outcome.profiles_written,
        outcome.report_path.display()
    );

    if outcome.resolved_entities == 0 {
        return Err(AppError::NoResolvableEntities);
    }

    Ok(())
}
