//! rescale CLI - scale STL models and convert between binary and ASCII STL.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use rescale_stl::encode::check_target;
use rescale_stl::{
    read_stl_with, write_stl_with, DecodeOptions, Decoded, MeshStats, ScaleFactor, StlError,
    StlFormat,
};
use tracing::{debug, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod config;
mod report;

use config::Config;
use report::{stats_text, InfoReport};

#[derive(Parser)]
#[command(name = "rescale", version)]
#[command(about = "Scale STL models and convert between binary and ASCII STL", long_about = None)]
struct Cli {
    /// Settings file (default: ./rescale.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scale a model and write the result to a new .stl file
    Scale {
        /// Input STL file (binary or ASCII)
        input: PathBuf,
        /// Output .stl file
        output: PathBuf,
        /// Scale factor, as a decimal (2.5) or a ratio (1:36)
        #[arg(short, long, allow_negative_numbers = true, conflicts_with_all = ["from", "preset"])]
        factor: Option<ScaleFactor>,
        /// Scale the model was built at, e.g. 1:1
        #[arg(long, requires = "to", conflicts_with = "preset")]
        from: Option<String>,
        /// Scale to convert to, e.g. 1:36
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Named preset from the settings file
        #[arg(short, long)]
        preset: Option<String>,
        #[command(flatten)]
        format: FormatArgs,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Show format, size, volume and area of a model
    Info {
        /// STL file to inspect
        file: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Re-encode a model without scaling it
    Convert {
        /// Input STL file (binary or ASCII)
        input: PathBuf,
        /// Output .stl file
        output: PathBuf,
        #[command(flatten)]
        format: FormatArgs,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// List the presets from the settings file
    Presets,
}

#[derive(Args)]
struct FormatArgs {
    /// Write ASCII STL
    #[arg(long, conflicts_with = "binary")]
    ascii: bool,
    /// Write binary STL
    #[arg(long)]
    binary: bool,
}

impl FormatArgs {
    fn resolve(&self, config: &Config) -> StlFormat {
        if self.ascii {
            StlFormat::Ascii
        } else if self.binary {
            StlFormat::Binary
        } else {
            config.output_format()
        }
    }
}

#[derive(Args)]
struct DecodeArgs {
    /// Fail on unparseable numbers or incomplete facets instead of using zeros
    #[arg(long)]
    strict: bool,
}

impl DecodeArgs {
    fn options(&self) -> DecodeOptions {
        DecodeOptions {
            strict: self.strict,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scale {
            input,
            output,
            factor,
            from,
            to,
            preset,
            format,
            decode,
        } => {
            let factor = match (factor, from.zip(to), preset) {
                (Some(factor), _, _) => factor,
                (None, Some((from, to)), _) => ScaleFactor::convert(&from, &to)?,
                (None, None, Some(name)) => config.preset(&name)?,
                (None, None, None) => config.default_factor()?,
            };
            scale_file(&config, &input, &output, factor, &format, &decode)?;
        }
        Commands::Info { file, json, decode } => {
            show_info(&file, json, &decode)?;
        }
        Commands::Convert {
            input,
            output,
            format,
            decode,
        } => {
            convert_file(&config, &input, &output, &format, &decode)?;
        }
        Commands::Presets => {
            list_presets(&config);
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        // RUST_LOG decides, falling back to warnings only
        0 => EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy(),
        n => {
            let level = match n {
                1 => LevelFilter::INFO,
                2 => LevelFilter::DEBUG,
                _ => LevelFilter::TRACE,
            };
            EnvFilter::from_default_env().add_directive(level.into())
        }
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn read_input(input: &Path, decode: &DecodeArgs) -> Result<Decoded> {
    let decoded = read_stl_with(input, &decode.options())
        .with_context(|| format!("failed to read {}", input.display()))?;
    if !decoded.warnings.is_empty() {
        warn!(
            count = decoded.warnings.len(),
            "{} was read with recovered fields (use --strict to reject)",
            input.display()
        );
    }
    Ok(decoded)
}

fn write_output(
    config: &Config,
    output: &Path,
    decoded: &Decoded,
    format: StlFormat,
) -> Result<()> {
    let options = config.ascii_options(decoded.solid_name.as_deref());
    discard_on_error(output, || {
        write_stl_with(&decoded.mesh, output, format, &options)
    })
}

/// Run a write into `output`, removing the file if the write failed midway.
///
/// Only I/O failures remove anything: target and validation errors are raised
/// before the file is opened, so an existing file there is left alone.
fn discard_on_error(output: &Path, write: impl FnOnce() -> rescale_stl::Result<()>) -> Result<()> {
    let result = write();
    if let Err(StlError::Encode(_)) = &result {
        match fs::remove_file(output) {
            Ok(()) => warn!(path = %output.display(), "removed partially written output"),
            Err(e) => debug!(path = %output.display(), error = %e, "no partial output to remove"),
        }
    }
    result.with_context(|| format!("failed to write {}", output.display()))
}

fn scale_file(
    config: &Config,
    input: &Path,
    output: &Path,
    factor: ScaleFactor,
    format: &FormatArgs,
    decode: &DecodeArgs,
) -> Result<()> {
    check_target(output)?;
    let mut decoded = read_input(input, decode)?;
    decoded.mesh.scale_uniform(factor);

    let format = format.resolve(config);
    write_output(config, output, &decoded, format)?;
    info!(input = %input.display(), output = %output.display(), %factor, "scaled model");

    println!(
        "Scaled {} by {} to {} ({})",
        input.display(),
        factor,
        output.display(),
        format
    );
    print!("{}", stats_text(&MeshStats::of(&decoded.mesh)));
    Ok(())
}

fn convert_file(
    config: &Config,
    input: &Path,
    output: &Path,
    format: &FormatArgs,
    decode: &DecodeArgs,
) -> Result<()> {
    check_target(output)?;
    let decoded = read_input(input, decode)?;
    let format = format.resolve(config);
    write_output(config, output, &decoded, format)?;
    println!(
        "Converted {} ({}) to {} ({})",
        input.display(),
        decoded.format,
        output.display(),
        format
    );
    Ok(())
}

fn show_info(file: &Path, json: bool, decode: &DecodeArgs) -> Result<()> {
    let decoded = read_input(file, decode)?;
    let report = InfoReport::new(file, &decoded);
    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}

fn list_presets(config: &Config) {
    if config.presets.is_empty() {
        println!("No presets configured");
        return;
    }
    for (name, preset) in &config.presets {
        match preset.factor() {
            Ok(factor) => print!("{name}: x{factor}"),
            Err(e) => print!("{name}: invalid ({e})"),
        }
        if let Some(desired) = &preset.desired_scale {
            print!(" [{} -> {}]", preset.original_scale, desired);
        }
        if let Some(notes) = &preset.notes {
            print!(" - {notes}");
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_failed_write_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.stl");

        let err = discard_on_error(&output, || {
            fs::write(&output, b"solid partial\n").unwrap();
            Err(StlError::Encode(io::Error::other("disk full")))
        })
        .unwrap_err();

        assert!(err.to_string().contains("failed to write"));
        assert!(!output.exists());
    }

    #[test]
    fn test_rejected_target_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.stl");
        fs::write(&output, b"previous").unwrap();

        let result = discard_on_error(&output, || {
            Err(StlError::FacetCountOverflow(usize::MAX))
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&output).unwrap(), b"previous");
    }

    #[test]
    fn test_successful_write_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.stl");

        discard_on_error(&output, || {
            fs::write(&output, b"solid ok\n").unwrap();
            Ok(())
        })
        .unwrap();

        assert!(output.exists());
    }
}
