//! pointstream: streaming point-cloud loader
//!
//! Usage: pointstream <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use pointstream::commands::{
    write_points, write_summary, GenerateCommand, GenerateConfig, LoadCommand, Shape, SizeSpec,
};
use pointstream::{ExecutionMode, LoadError, PointFormat};

#[derive(Parser)]
#[command(name = "pointstream")]
#[command(version)]
#[command(about = "pointstream: streaming loader for PLY ASCII and XYZ point clouds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that loads a cloud.
#[derive(clap::Args)]
struct LoadArgs {
    /// Input file (use - or omit for stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Input format: auto|ply|xyz
    #[arg(long, default_value = "auto")]
    format: String,

    /// Execution mode: cooperative|offloaded
    #[arg(long, default_value = "cooperative")]
    mode: String,

    /// Decoded records between progress reports
    #[arg(long, default_value = "50000")]
    batch_size: usize,

    /// Bytes read per chunk
    #[arg(long, default_value = "262144")]
    chunk_size: usize,

    /// Print load progress to stderr
    #[arg(long)]
    progress: bool,

    /// Print load statistics to stderr
    #[arg(long)]
    stats: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a point cloud and print a summary
    Load {
        #[command(flatten)]
        args: LoadArgs,
    },

    /// Load a point cloud and write every point as `x y z r g b`
    Dump {
        #[command(flatten)]
        args: LoadArgs,
    },

    /// Generate a synthetic point cloud for benchmarking
    Generate {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of points (e.g., "100K", "5M")
        #[arg(short = 'n', long, default_value = "1M")]
        count: String,

        /// Output format: ply|xyz
        #[arg(long, default_value = "ply")]
        format: String,

        /// Shape: cube|sphere
        #[arg(long, default_value = "cube")]
        shape: String,

        /// Half edge of the cube or radius of the sphere
        #[arg(long, default_value = "100.0")]
        extent: f64,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Write white points (xyz: omit color columns)
        #[arg(long)]
        no_color: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Load { args } => run_load(args, false),
        Commands::Dump { args } => run_load(args, true),
        Commands::Generate {
            output,
            count,
            format,
            shape,
            extent,
            seed,
            no_color,
        } => run_generate(output, count, format, shape, extent, seed, no_color),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_format(s: &str) -> Result<Option<PointFormat>, LoadError> {
    if s.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    PointFormat::from_str(s)
        .map(Some)
        .ok_or_else(|| LoadError::UnknownFormat(format!("'{}'. Use: auto, ply, xyz", s)))
}

fn run_load(args: LoadArgs, dump: bool) -> Result<(), LoadError> {
    let format = parse_format(&args.format)?;
    let mode = ExecutionMode::from_str(&args.mode).ok_or_else(|| {
        LoadError::InvalidArgument(format!(
            "Invalid mode '{}'. Use: cooperative, offloaded",
            args.mode
        ))
    })?;

    let cmd = LoadCommand::new()
        .with_format(format)
        .with_execution(mode)
        .with_batch_size(args.batch_size)
        .with_chunk_size(args.chunk_size);

    let show_progress = args.progress;
    let (points, stats) = cmd.load(args.input.as_deref(), |p| {
        if show_progress {
            eprintln!("Progress: {:.1}%", p.percentage);
        }
    })?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if dump {
        write_points(&points, &mut handle)?;
    } else {
        write_summary(&points, &mut handle)?;
        handle.flush()?;
    }

    if args.stats {
        eprintln!("{}", stats);
    }
    Ok(())
}

fn run_generate(
    output: PathBuf,
    count: String,
    format: String,
    shape: String,
    extent: f64,
    seed: u64,
    no_color: bool,
) -> Result<(), LoadError> {
    let count = SizeSpec::from_str(&count).ok_or_else(|| {
        LoadError::InvalidArgument(format!(
            "Invalid size '{}'. Use formats like 1K, 5M, 100",
            count
        ))
    })?;
    let format = PointFormat::from_str(&format)
        .ok_or_else(|| LoadError::UnknownFormat(format!("'{}'. Use: ply, xyz", format)))?;
    let shape = Shape::from_str(&shape).ok_or_else(|| {
        LoadError::InvalidArgument(format!("Invalid shape '{}'. Use: cube, sphere", shape))
    })?;
    if !(extent.is_finite() && extent > 0.0) {
        return Err(LoadError::InvalidArgument(format!(
            "Invalid extent '{}'. Must be a positive number",
            extent
        )));
    }

    let config = GenerateConfig {
        output,
        count: count.count,
        format,
        shape,
        extent,
        seed,
        color: !no_color,
    };
    GenerateCommand::new(config).run()?;
    Ok(())
}
