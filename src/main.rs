use anyhow::Context;
use clap::{Parser, Subcommand};
use pocketkit::{
    init_logging, plan_loops, pocket, prepare_regions, GcodeWriter, Job, PlanContext,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "pocketkit")]
#[command(about = "Plan pocket clearing toolpaths and write G-code")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a job and write the G-code program
    Plan {
        /// Job file (.json or .toml)
        job: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the planned loops of the first depth as JSON
    Loops {
        /// Job file (.json or .toml)
        job: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json)?;

    match cli.command {
        Commands::Plan { job, output } => {
            let job = Job::load_from_file(&job)
                .with_context(|| format!("loading job {}", job.display()))?;
            let region = job.to_region()?;
            let mut writer = GcodeWriter::new(job.gcode.clone());
            let summary = pocket(
                &region,
                &job.pocket,
                &job.depths,
                &PlanContext::default(),
                &mut writer,
            )?;
            info!(
                "{} pocket: {} loops over {} depths, {} retracts",
                job.pocket.strategy, summary.loops, summary.depths, summary.retracts
            );
            let program = writer.finish();
            match output {
                Some(path) => std::fs::write(&path, program)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => print!("{}", program),
            }
        }
        Commands::Loops { job } => {
            let job = Job::load_from_file(&job)
                .with_context(|| format!("loading job {}", job.display()))?;
            let region = job.to_region()?;
            let (cut, _safety) = prepare_regions(&region, &job.pocket)?;
            let loops = plan_loops(&cut, &job.pocket, &PlanContext::default())?;
            println!("{}", serde_json::to_string_pretty(&loops)?);
        }
    }

    Ok(())
}
