//! RPCd - command-line entrypoint.
//!
//! Initializes logging, loads configuration, and either starts the
//! management service, validates a configuration file, or writes out a
//! default configuration file.

use clap::{Parser, Subcommand};
use rpcd_lib::error::{set_error_reporter, RpcdError, RpcdResult, TracingErrorReporter};
use rpcd_lib::{client, config, server};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::info;

/// Command line arguments for RPCd.
#[derive(Parser, Debug)]
#[clap(name = "rpcd", version, author, about)]
struct Args {
    /// Path to configuration file
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Command to execute
    #[clap(subcommand)]
    command: Option<Command>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the management service and block until it is stopped.
    Start,

    /// Validate the configuration file without starting the service.
    Validate,

    /// Write out a default configuration file.
    GenConfig {
        /// Path to the output configuration file.
        #[clap(short, long, value_parser)]
        output: PathBuf,
    },

    /// Send one request to a running instance and print its response.
    Call {
        /// Path to the service's Unix socket.
        #[clap(short, long, value_parser)]
        socket: PathBuf,

        /// Raw JSON-RPC request body.
        request: String,
    },
}

/// Initializes the tracing subscriber from `RUST_LOG`.
fn init_logging() -> RpcdResult<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_line_number(true)
        .with_file(true)
        .with_thread_names(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| RpcdError::Custom(format!("failed to set global tracing subscriber: {e}")))
}

fn main() -> RpcdResult<()> {
    init_logging()?;
    set_error_reporter(Arc::new(TracingErrorReporter));

    let args = <Args as clap::Parser>::parse();
    let env_prefix = "RPCD";
    let config_loader = config::ConfigLoader::new(args.config.as_deref(), env_prefix);

    match args.command.unwrap_or(Command::Start) {
        Command::Start => {
            info!("starting rpcd");

            let loaded = match config_loader.load() {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!("configuration error: {e}");
                    process::exit(1);
                }
            };

            if config::init_global_config(loaded).is_err() {
                tracing::warn!("global configuration was already initialized");
            }
            let rpcd_config = config::get_global_config().get();

            if !rpcd_config.rpc.enabled {
                info!("rpc service disabled via configuration; exiting");
                return Ok(());
            }

            let mut handle = server::Server::new(rpcd_config.rpc.comm_config.clone())?;
            handle.start()?;
            info!("rpcd listening on {:?}", rpcd_config.rpc.comm_config.sock_path_name);

            // Block the main thread for the lifetime of the process; Ctrl-C
            // / SIGTERM terminates the process and the worker thread with
            // it. `stop()` exists for embedders and tests.
            loop {
                std::thread::park();
            }
        }
        Command::Validate => {
            info!("validating configuration");
            match config_loader.load() {
                Ok(_) => {
                    info!("configuration is valid");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("configuration validation error: {e}");
                    process::exit(1);
                }
            }
        }
        Command::GenConfig { output } => {
            info!("generating default configuration");
            let default_config = config::RpcdConfig::default();

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).map_err(RpcdError::Io)?;
            }

            let toml = toml::to_string_pretty(&default_config)
                .map_err(|e| RpcdError::Custom(format!("failed to serialize config: {e}")))?;

            std::fs::write(&output, toml).map_err(RpcdError::Io)?;
            info!("default configuration written to {output:?}");
            Ok(())
        }
        Command::Call { socket, request } => {
            let response = client::Client::new(socket).call(request.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&response));
            Ok(())
        }
    }
}
