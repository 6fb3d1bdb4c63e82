//! coverbin CLI - covered storage bin generator
//!
//! Compiles parameters (from a preset file and/or `-D key=value` overrides)
//! into an OpenSCAD source file or an IR document.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use coverbin::{build, BuildParameters, PresetFile, RawParameters};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "coverbin")]
#[command(about = "Parametric storage bins with fitted lids", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one bin/lid output
    Build {
        /// TOML preset file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Preset name within the config file
        #[arg(short, long, requires = "config")]
        preset: Option<String>,
        /// Parameter override, e.g. -D divx=4 (repeatable)
        #[arg(short = 'D', value_name = "KEY=VALUE")]
        define: Vec<String>,
        /// Part selection (bin, lid, both-closed, both-open, slice)
        #[arg(long)]
        part: Option<String>,
        /// Output file (.scad or .json)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Build every preset in a config file
    Batch {
        /// TOML preset file
        #[arg(short, long)]
        config: PathBuf,
        /// Output directory
        #[arg(short, long)]
        out_dir: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Scad)]
        format: Format,
    },
    /// Display information about an IR document
    Info {
        /// Path to the .json document
        file: PathBuf,
    },
    /// List presets and their resolved tolerances
    Presets {
        /// TOML preset file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Scad,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext.to_lowercase().as_str() {
            "scad" => Ok(Format::Scad),
            "json" => Ok(Format::Json),
            _ => anyhow::bail!("Unknown output format: '{}' (expected .scad or .json)", ext),
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Format::Scad => "scad",
            Format::Json => "json",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Build {
            config,
            preset,
            define,
            part,
            output,
        } => {
            let params = resolve_params(config.as_deref(), preset.as_deref(), &define, part)?;
            write_output(&params, &output, Format::from_path(&output)?)?;
            println!("Wrote {} to {}", params.part, output.display());
        }
        Commands::Batch {
            config,
            out_dir,
            format,
        } => {
            let file = load_presets(&config)?;
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;
            for (name, raw) in file.resolve_all() {
                let params = raw
                    .validate()
                    .with_context(|| format!("preset '{}'", name))?;
                let path = out_dir.join(format!("{}.{}", name, format.extension()));
                write_output(&params, &path, format)?;
                println!("{} -> {}", name, path.display());
            }
        }
        Commands::Info { file } => show_info(&file)?,
        Commands::Presets { config } => list_presets(&config)?,
    }

    Ok(())
}

fn load_presets(path: &Path) -> Result<PresetFile> {
    let source =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file = PresetFile::from_toml_str(&source)
        .with_context(|| format!("parsing {}", path.display()))?;
    debug!(presets = file.preset.len(), "loaded preset file");
    Ok(file)
}

/// Preset file defaults, then the named preset, then `-D` overrides, then `--part`.
fn resolve_params(
    config: Option<&Path>,
    preset: Option<&str>,
    defines: &[String],
    part: Option<String>,
) -> Result<BuildParameters> {
    let mut raw = match config {
        Some(path) => {
            let file = load_presets(path)?;
            match preset {
                Some(name) => file.resolve(name)?,
                None => file.defaults.clone(),
            }
        }
        None => RawParameters::default(),
    };

    for define in defines {
        raw.apply_override(define)?;
    }
    if part.is_some() {
        raw.part = part;
    }

    Ok(raw.validate()?)
}

fn write_output(params: &BuildParameters, path: &Path, format: Format) -> Result<()> {
    let output = build(params);
    let doc = output.to_document();
    info!(
        nodes = doc.nodes.len(),
        roots = doc.roots.len(),
        path = %path.display(),
        "writing output"
    );
    let text = match format {
        Format::Scad => coverbin_ir::to_scad(&doc)?,
        Format::Json => doc.to_json()?,
    };
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn show_info(file: &Path) -> Result<()> {
    let json = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let doc = coverbin_ir::Document::from_json(&json)?;
    doc.validate()?;

    println!("coverbin document: {}", file.display());
    println!("  Version: {}", doc.version);
    println!("  Nodes: {}", doc.nodes.len());
    println!("  Materials: {}", doc.materials.len());
    println!("  Scene entries: {}", doc.roots.len());

    if !doc.roots.is_empty() {
        println!("\nScene:");
        for (i, entry) in doc.roots.iter().enumerate() {
            println!(
                "  {}: {} (root n{}, material: {})",
                i + 1,
                entry.name,
                entry.root,
                entry.material
            );
        }
    }

    println!("\nOperations:");
    for (kind, count) in doc.op_histogram() {
        println!("  {:<16} {}", kind, count);
    }

    Ok(())
}

fn list_presets(config: &Path) -> Result<()> {
    let file = load_presets(config)?;
    if file.preset.is_empty() {
        println!("No presets in {}", config.display());
        return Ok(());
    }

    for (name, raw) in file.resolve_all() {
        match raw.validate() {
            Ok(params) => {
                let t = coverbin::resolve(params.lid_fit_tolerance);
                println!(
                    "{}: {}x{} cells, body {:.2} mm, {}x{} pockets, grip {}, {}, part {}",
                    name,
                    params.grid_x,
                    params.grid_y,
                    params.height.body_height(),
                    params.divx,
                    params.divy,
                    params.grip,
                    params.interior,
                    params.part
                );
                println!(
                    "    clearances: horizontal {:.3}, vertical {:.3}, engagement {:.3}, tab {:.3}",
                    t.horizontal, t.vertical, t.lip_engagement, t.tab_insertion
                );
            }
            Err(e) => println!("{}: invalid ({})", name, e),
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "coverbin=info,coverbin_cli=info",
            2 => "coverbin=debug,coverbin_cli=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverbin::Part;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a.scad")).unwrap(), Format::Scad);
        assert_eq!(Format::from_path(Path::new("a.JSON")).unwrap(), Format::Json);
        assert!(Format::from_path(Path::new("a.stl")).is_err());
    }

    #[test]
    fn test_defines_and_part_flag() {
        let defines = vec!["divx=3".to_string(), "grip_mode=full".to_string()];
        let params = resolve_params(None, None, &defines, Some("slice".into())).unwrap();
        assert_eq!(params.divx, 3);
        assert_eq!(params.part, Part::Slice);
        assert_eq!(params.grip, coverbin::GripMode::Full);
    }

    #[test]
    fn test_bad_define_is_reported() {
        let defines = vec!["grid_x=0".to_string()];
        assert!(resolve_params(None, None, &defines, None).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "coverbin", "-vv", "build", "-D", "divx=2", "-D", "divy=2", "-o", "out.scad",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Build { define, .. } => assert_eq!(define.len(), 2),
            _ => panic!("expected build"),
        }
    }
}
