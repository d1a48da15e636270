use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::instrument;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "wmove",
    version,
    about = "Move files from a directory tree into destination directories chosen by weight",
    long_about = "`wmove` walks a source directory tree and moves every file into one of the destination
directories listed in a weight file. Each destination is chosen at random with probability
proportional to its weight. Files are flattened: only the file name is kept.

WEIGHT FILE:
    One `<weight>:<directory>` entry per line, e.g.

        1:/mnt/disk1/media
        3:/mnt/disk2/media

    Relative directories are resolved against the current working directory. Destination
    directories must already exist.

EXAMPLE:
    # Move everything under ./incoming, three times as often to disk2 as to disk1
    wmove weights.txt ./incoming --summary

Note: source files are deleted once they have been copied. A file whose copy fails is left
in place."
)]
struct Args {
    // Copy options
    /// Size of the buffer used to stream each file
    ///
    /// Accepts human readable sizes, e.g. "64KiB", "1MiB".
    #[arg(
        long,
        default_value = "100KiB",
        value_name = "SIZE",
        help_heading = "Copy options"
    )]
    buffer_size: String,

    // Progress & output
    /// Log copy progress at 25%, 50% and 75% of each file
    #[arg(long, help_heading = "Progress & output")]
    progress: bool,

    /// Print summary at the end
    #[arg(long, help_heading = "Progress & output")]
    summary: bool,

    /// Verbose level: -v DEBUG / -vv TRACE (default: INFO)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Quiet mode, don't log anything
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    /// Format of the log events written to stdout
    #[arg(
        long,
        value_enum,
        default_value_t = common::LogFormat::Json,
        value_name = "FORMAT",
        help_heading = "Progress & output"
    )]
    log_format: common::LogFormat,

    // ARGUMENTS
    /// File listing `<weight>:<directory>` destinations, one per line
    #[arg()]
    weight_file: std::path::PathBuf,

    /// Directory tree whose files are moved
    #[arg()]
    source: std::path::PathBuf,
}

#[instrument]
fn wmove_main(args: Args) -> Result<common::Summary> {
    let buffer_size = args
        .buffer_size
        .parse::<bytesize::ByteSize>()
        .map_err(|err| anyhow!("invalid --buffer-size {:?}: {}", &args.buffer_size, err))?
        .as_u64();
    let copier = common::CopyConfig {
        buffer_size: usize::try_from(buffer_size).context("--buffer-size is too large")?,
    }
    .copier()
    .map_err(|err| anyhow!(err))?;
    let table = common::parse_weight_file(&args.weight_file)
        .with_context(|| format!("wmove: cannot load weights from {:?}", &args.weight_file))?;
    for entry in table.entries() {
        tracing::info!(weight = entry.weight, path = %entry.path.display(), "destination");
    }
    let summary = common::distribute(
        &args.source,
        &table,
        copier,
        common::distribute::Settings {
            progress: args.progress,
        },
    )
    .with_context(|| format!("wmove: cannot distribute {:?}", &args.source))?;
    Ok(summary)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: args.summary,
        log_format: args.log_format,
    };
    if common::run(output, || wmove_main(args)).is_none() {
        std::process::exit(1);
    }
    Ok(())
}
