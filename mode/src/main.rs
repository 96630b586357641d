//! Compare one forecast field against one observation field.
//!
//! Usage: `mode <fcst> <obs> <config> [--outdir DIR] [--log-level LEVEL] [--space-time]`
//!
//! Fields with more than one time slice always take the space-time path,
//! which writes labeled object fields and per-object summaries only.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use mode::space_time::{summarize, write_summary};
use mode::{Config, DataPlane, Engine, EngineOutput, FieldRecord, identify_space_time_objects};

#[derive(Parser, Debug)]
#[command(name = "mode")]
#[command(about = "Identify, merge and match forecast and observation objects")]
struct Args {
    /// Forecast field file (YAML or JSON)
    fcst: PathBuf,

    /// Observation field file (YAML or JSON)
    obs: PathBuf,

    /// Configuration file (YAML or JSON)
    config: PathBuf,

    /// Output directory for results, object files and logs
    #[arg(long = "outdir", default_value = "mode_out")]
    outdir: PathBuf,

    /// Base log level; RUST_LOG overrides it
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,

    /// Identify space-time objects instead of matching single slices
    #[arg(long = "space-time")]
    space_time: bool,
}

fn main() {
    let args = Args::parse();
    common::log_setup::setup_logging(&args.log_level, Some(&args.outdir.join("logs")));

    process::exit(exit_code(run(&args)));
}

fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = Config::read(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;

    let fcst = read_field(&args.fcst)?;
    let obs = read_field(&args.obs)?;
    if fcst.valid_time != obs.valid_time {
        warn!(
            fcst = ?fcst.valid_time,
            obs = ?obs.valid_time,
            "Forecast and observation valid times differ"
        );
    }
    info!(
        fcst = %fcst.name,
        obs = %obs.name,
        nx = fcst.nx,
        ny = fcst.ny,
        nt = fcst.nt,
        "Read fields"
    );

    let fcst = fcst.into_data_plane().context("Invalid forecast field")?;
    let obs = obs.into_data_plane().context("Invalid observation field")?;

    std::fs::create_dir_all(&args.outdir)
        .with_context(|| format!("Failed to create {}", args.outdir.display()))?;

    if args.space_time || fcst.nt() > 1 || obs.nt() > 1 {
        run_space_time(args, &config, fcst, obs)
    } else {
        run_matching(args, config, fcst, obs)
    }
}

fn run_matching(args: &Args, config: Config, fcst: DataPlane, obs: DataPlane) -> Result<()> {
    let mut engine = Engine::new(config, fcst, obs)?;
    engine.run()?;

    let output = EngineOutput::from_engine(&engine)?;
    let output_path = args.outdir.join("mode_output.json");
    output.write(&output_path)?;
    engine
        .fcst()
        .objects
        .write(&args.outdir.join("fcst_objects.json"))?;
    engine
        .obs()
        .objects
        .write(&args.outdir.join("obs_objects.json"))?;

    info!(
        n_matches = engine.matches().len(),
        path = %output_path.display(),
        "Wrote results"
    );
    Ok(())
}

fn run_space_time(args: &Args, config: &Config, fcst: DataPlane, obs: DataPlane) -> Result<()> {
    let objects = identify_space_time_objects(config, fcst, obs)?;

    for (side, field) in [("fcst", &objects.fcst), ("obs", &objects.obs)] {
        field.write(&args.outdir.join(format!("{side}_objects.json")))?;
        write_summary(
            &summarize(field)?,
            &args.outdir.join(format!("{side}_space_time.json")),
        )?;
    }

    info!(
        n_fcst = objects.fcst.n_objects(),
        n_obs = objects.obs.n_objects(),
        outdir = %args.outdir.display(),
        "Wrote space-time objects"
    );
    Ok(())
}

fn read_field(path: &Path) -> Result<FieldRecord> {
    FieldRecord::read(path).with_context(|| format!("Failed to read field {}", path.display()))
}
