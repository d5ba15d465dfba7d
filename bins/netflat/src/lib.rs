//! Command-line front end for [`netflat`].
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser as ClapParser;
use netflat::{ComponentRef, Extraction, FlattenOptions, Library};

/// Arguments to [`run`].
#[derive(ClapParser, Debug, Clone)]
#[command(
    version,
    about,
    long_about = "Flatten a hierarchical schematic design into a netlist of primitive devices"
)]
pub struct Args {
    /// The path to the design, a JSON list of modules.
    pub design: PathBuf,
    /// The name of the module to flatten.
    #[arg(short, long, default_value = "top")]
    pub top: String,
    /// A TOML file containing flatten options.
    ///
    /// Leaves and globals given on the command line are added
    /// to those in the file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// The names of modules to emit as primitive devices.
    #[arg(short, long)]
    pub leaf: Vec<String>,
    /// Signals that are global at every level of the hierarchy.
    #[arg(short, long)]
    pub global: Vec<String>,
    /// The path where the output netlist should be saved.
    ///
    /// If unspecified, the output will be written to stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Builds the flatten options from the config file and command line flags.
pub fn load_options(args: &Args) -> anyhow::Result<FlattenOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {:?}.", path))?;
            toml::from_str::<FlattenOptions>(&text)
                .with_context(|| format!("Failed to parse config file {:?}.", path))?
        }
        None => FlattenOptions::default(),
    };
    options
        .leaves
        .extend(args.leaf.iter().map(|leaf| leaf.as_str().into()));
    options
        .globals
        .extend(args.global.iter().map(|global| global.as_str().into()));
    Ok(options)
}

/// Reads a design library from a JSON file.
pub fn load_library(path: impl AsRef<Path>) -> anyhow::Result<Library> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read design file {:?}.", path))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse design file {:?}.", path))
}

/// Flattens `top`, reporting the components involved in any failure to stderr.
pub fn flatten(lib: &Library, top: &str, options: &FlattenOptions) -> anyhow::Result<Extraction> {
    match lib.flatten(top, options) {
        Ok(extraction) => Ok(extraction),
        Err(err) => {
            err.highlight(&mut |component: &ComponentRef| eprintln!("  in {component}"));
            Err(err).with_context(|| format!("Failed to flatten module `{top}`."))
        }
    }
}

/// Writes the netlist as JSON to `out`, or to stdout if no path is given.
pub fn write_netlist(extraction: &Extraction, out: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&extraction.netlist)
        .with_context(|| "Failed to serialize netlist.")?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}.", parent))?;
            }
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write netlist to {:?}.", path))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").with_context(|| "Failed to write netlist to stdout.")?;
        }
    }
    Ok(())
}

/// Loads the design, flattens it, and writes the netlist.
pub fn run(args: Args) -> anyhow::Result<Extraction> {
    let options = load_options(&args)?;
    let lib = load_library(&args.design)?;
    tracing::info!(
        design = ?args.design,
        top = %args.top,
        leaves = options.leaves.len(),
        "flattening design"
    );
    let extraction = flatten(&lib, &args.top, &options)?;
    write_netlist(&extraction, args.out.as_deref())?;
    tracing::info!(
        devices = extraction.netlist.len(),
        nodes = extraction.netlist.nodes().len(),
        "netlist writing complete"
    );
    Ok(extraction)
}
