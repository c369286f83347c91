use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::ingestion::MeshFormat;
use crate::transform::TransformOptions;

/// Fully resolved processor configuration (constructed from CLI args).
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Directory acting as the object store root.
    pub store_root: PathBuf,
    /// Prefix stripped from logical model paths before fetching.
    pub base_path: String,
    /// Mesh extension used for fallback loads and catalog id stripping.
    pub format: MeshFormat,
    /// Caller-level deadline for one request on the HTTP surface.
    pub request_timeout: Duration,
    pub verbose: bool,
    pub log_json: bool,
    pub threads: Option<usize>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("."),
            base_path: String::new(),
            format: MeshFormat::Obj,
            request_timeout: Duration::from_secs(30),
            verbose: false,
            log_json: false,
            threads: None,
        }
    }
}

/// CLI argument definition (clap derive).
#[derive(Parser, Debug)]
#[command(
    name = "mesh-probe",
    about = "Mesh ingestion and geometric analysis over a blob store",
    version
)]
pub struct CliArgs {
    /// Directory used as the object store
    #[arg(short = 's', long, global = true, default_value = ".")]
    pub store: PathBuf,

    /// Prefix stripped from model paths before fetching
    #[arg(long, global = true, default_value = "")]
    pub base_path: String,

    /// Mesh format of catalog entries and fallback loads
    #[arg(long, global = true, value_enum, default_value = "obj")]
    pub format: MeshFormat,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Worker thread count (default: all cores)
    #[arg(short = 'j', long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every model in the store
    List,

    /// Compute volume, area, counts and topology flags
    Analyze {
        /// Model id (loaded as <ID>.<format> when not cached)
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// Analyze every model in the catalog
        #[arg(long)]
        all: bool,
    },

    /// Load a model and print it as JSON
    Show {
        id: String,

        /// Load from this path instead of <ID>.<format>
        #[arg(long)]
        path: Option<String>,
    },

    /// Load a model, transform it and print the result
    Modify {
        id: String,

        #[command(flatten)]
        transform: TransformArgs,
    },

    /// Read or write the metadata sibling of a storage key
    Metadata {
        #[command(subcommand)]
        action: MetadataAction,
    },

    /// Invoke the tool surface with a JSON request
    Tool {
        /// Request such as {"tool":"analyze_model","model_id":"part1"}
        request: String,
    },

    /// Serve the HTTP surface
    #[cfg(feature = "server")]
    Serve {
        /// Listen address
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,

        /// Per-request deadline in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum MetadataAction {
    /// Print the metadata for KEY, or null
    Get { key: String },

    /// Replace the metadata for KEY with a JSON value
    Set { key: String, json: String },
}

/// Scale, rotation and translation triples as `X,Y,Z`.
#[derive(Args, Debug, Clone, Default)]
pub struct TransformArgs {
    /// Per-axis scale factors
    #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
    pub scale: Option<[f32; 3]>,

    /// Per-axis rotation in radians, applied X then Y then Z
    #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
    pub rotate: Option<[f32; 3]>,

    /// Per-axis offset
    #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
    pub translate: Option<[f32; 3]>,
}

impl From<&TransformArgs> for TransformOptions {
    fn from(args: &TransformArgs) -> Self {
        TransformOptions {
            scale: args.scale,
            rotate: args.rotate,
            translate: args.translate,
        }
    }
}

/// Parse `X,Y,Z` into three floats.
fn parse_triple(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let &[x, y, z] = parts.as_slice() else {
        return Err(format!("expected X,Y,Z but got {} values", parts.len()));
    };
    let parse = |v: &str| v.parse::<f32>().map_err(|e| format!("invalid number {v:?}: {e}"));
    Ok([parse(x)?, parse(y)?, parse(z)?])
}

impl From<&CliArgs> for ProcessorConfig {
    fn from(args: &CliArgs) -> Self {
        let request_timeout = match &args.command {
            #[cfg(feature = "server")]
            Command::Serve { timeout_secs, .. } => Duration::from_secs(*timeout_secs),
            _ => ProcessorConfig::default().request_timeout,
        };

        ProcessorConfig {
            store_root: args.store.clone(),
            base_path: args.base_path.clone(),
            format: args.format,
            request_timeout,
            verbose: args.verbose,
            log_json: args.log_json,
            threads: args.threads,
        }
    }
}
