use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use argh::FromArgs;
use log::LevelFilter;

use viewsnap::compare::{self, DiffParams, FuzzyPolicy};
use viewsnap::store::Params as StoreParams;
use viewsnap::{ArtifactKind, Comparator, Config, PixelBuffer, SnapshotIdentity, SnapshotStore};

fn setup_logger(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level);

    let dispatch = match log_file {
        Some(path) => dispatch.chain(
            fern::log_file(path).with_context(|| format!("cannot open log file {:?}", path))?,
        ),
        None => dispatch.chain(std::io::stderr()),
    };

    dispatch.apply().context("failed to install logger")
}

#[derive(FromArgs)]
/// Pixel-exact snapshot comparison.
struct Args {
    /// log debug output
    #[argh(switch, short = 'v')]
    verbose: bool,
    /// log only warnings and errors
    #[argh(switch, short = 'q')]
    quiet: bool,
    /// write logs to this file instead of stderr
    #[argh(option)]
    log_file: Option<PathBuf>,
    /// config file to use instead of the default one
    #[argh(option)]
    config_file: Option<PathBuf>,
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Compare(CompareArgs),
    Path(PathArgs),
}

#[derive(FromArgs)]
/// Compare a candidate PNG against a reference PNG.
#[argh(subcommand, name = "compare")]
struct CompareArgs {
    /// freshly rendered image
    #[argh(positional)]
    candidate: PathBuf,
    /// recorded reference image
    #[argh(positional)]
    reference: PathBuf,
    /// where to write a diff image if the images differ
    #[argh(option)]
    diff: Option<PathBuf>,
    /// per-channel tolerance for premultiplied RGBA images, enables fuzzy matching
    #[argh(option)]
    tolerance: Option<u8>,
    /// number of pixels allowed beyond the tolerance
    #[argh(option, default = "0")]
    max_pixels: u64,
}

#[derive(FromArgs)]
/// Print where an artifact of a snapshot is stored.
#[argh(subcommand, name = "path")]
struct PathArgs {
    /// test case (suite) name
    #[argh(positional)]
    case: String,
    /// test method name
    #[argh(positional)]
    method: String,
    /// snapshot identifier
    #[argh(option, default = "String::new()")]
    identifier: String,
    /// artifact kind: reference, failed or diff
    #[argh(option, default = "ArtifactKind::Reference")]
    kind: ArtifactKind,
    /// device scale factor
    #[argh(option, default = "1")]
    scale: u16,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    setup_logger(
        match (args.verbose, args.quiet) {
            (true, _) => LevelFilter::Debug,
            (_, true) => LevelFilter::Warn,
            _ => LevelFilter::Info,
        },
        args.log_file.as_deref(),
    )?;

    let config = Config::load(args.config_file.or_else(Config::path_from_env))?;

    match args.command {
        Command::Compare(cmd) => {
            if !compare_files(&config, cmd)? {
                std::process::exit(1);
            }
        }
        Command::Path(cmd) => print_path(config, cmd)?,
    }

    Ok(())
}

fn read_image(path: &Path) -> Result<PixelBuffer> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {:?}", path))?;
    PixelBuffer::from_encoded_bytes(&bytes).with_context(|| format!("cannot decode {:?}", path))
}

fn compare_files(config: &Config, cmd: CompareArgs) -> Result<bool> {
    let candidate = read_image(&cmd.candidate)?;
    let reference = read_image(&cmd.reference)?;

    let comparator = match cmd.tolerance {
        Some(channel_tolerance) => Comparator::new(compare::Params {
            fuzzy: Some(FuzzyPolicy {
                channel_tolerance,
                max_differing_pixels: cmd.max_pixels,
            }),
        }),
        None => Comparator::new(config.param()),
    };

    let verdict = comparator
        .compare(&candidate, &reference)
        .context("images were produced with incompatible settings")?;
    println!("{:?}", verdict);

    if verdict.is_match() {
        return Ok(true);
    }

    if let Some(diff_path) = cmd.diff {
        let diff = compare::diff_image(&candidate, &reference, &config.param::<DiffParams>())?;
        std::fs::write(&diff_path, diff.to_encoded_bytes()?)
            .with_context(|| format!("cannot write diff image {:?}", diff_path))?;
        log::info!("wrote diff image to {:?}", diff_path);
    }

    Ok(false)
}

fn print_path(config: Config, cmd: PathArgs) -> Result<()> {
    let config = config.with_env()?;
    let store = SnapshotStore::new(StoreParams::try_from(&config)?);
    let identity = SnapshotIdentity::new(cmd.case, cmd.method, cmd.identifier);
    println!(
        "{}",
        store.path_for(&identity, cmd.kind, cmd.scale).display()
    );
    Ok(())
}
