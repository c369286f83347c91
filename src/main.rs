use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use mesh_probe::config::{CliArgs, Command, MetadataAction, ProcessorConfig};
use mesh_probe::processor::ModelProcessor;
use mesh_probe::tools;
use mesh_probe::transform::TransformOptions;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = ProcessorConfig::from(&args);

    // Init tracing; stdout is reserved for command output
    let filter = if config.verbose {
        EnvFilter::new("mesh_probe=debug")
    } else {
        EnvFilter::new("mesh_probe=info")
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    // Configure rayon thread pool
    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure rayon thread pool")?;
    }

    let processor = ModelProcessor::from_config(&config);

    run(args.command, processor, &config).inspect_err(|e| error!(error = %e, "Command failed"))
}

#[cfg_attr(not(feature = "server"), allow(unused_variables))]
fn run(command: Command, processor: ModelProcessor, config: &ProcessorConfig) -> anyhow::Result<()> {
    match command {
        Command::List => print_json(&processor.list_models().context("Failed to list models")?),
        Command::Analyze { all: true, .. } => {
            print_json(&processor.analyze_all().context("Batch analysis failed")?)
        }
        Command::Analyze { id, .. } => {
            let id = id.context("a model id or --all is required")?;
            print_json(&processor.analyze_model(&id)?)
        }
        Command::Show { id, path } => {
            let model = match path {
                Some(path) => processor.load_model(&id, &path)?,
                None => processor.get_model(&id)?,
            };
            print_json(model.as_ref())
        }
        Command::Modify { id, transform } => {
            // modify_model never loads; each CLI run starts with an empty
            // registry, so load explicitly first
            processor.get_model(&id)?;
            let model = processor.modify_model(&id, &TransformOptions::from(&transform))?;
            print_json(model.as_ref())
        }
        Command::Metadata { action } => match action {
            MetadataAction::Get { key } => print_json(&processor.get_file_metadata(&key)?),
            MetadataAction::Set { key, json } => {
                let value: serde_json::Value =
                    serde_json::from_str(&json).context("Metadata must be valid JSON")?;
                processor.set_file_metadata(&key, &value)?;
                println!("{}", tools::METADATA_UPDATED);
                Ok(())
            }
        },
        Command::Tool { request } => {
            let output = tools::dispatch_json(&processor, &request);
            println!("{}", output.text);
            if output.is_error {
                anyhow::bail!(
                    "tool call failed ({})",
                    output.error_kind.as_deref().unwrap_or("unknown")
                );
            }
            Ok(())
        }
        #[cfg(feature = "server")]
        Command::Serve { addr, .. } => {
            let addr: std::net::SocketAddr = addr
                .parse()
                .with_context(|| format!("Invalid listen address {addr:?}"))?;
            let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
            runtime
                .block_on(mesh_probe::server::serve(
                    addr,
                    std::sync::Arc::new(processor),
                    config.request_timeout,
                ))
                .context("HTTP server failed")
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}
