//! Command-line interface for dummy-source
//!
//! # Usage Examples
//!
//! ```bash
//! # Plugin identity and field schema, as JSON
//! dummy-source info
//! dummy-source fields
//!
//! # Deterministic capture (jitter 0): samples 11, 12, ... 15
//! dummy-source capture --config '{"jitter": 0}' --params '{"start": 10, "maxEvents": 5}'
//!
//! # Four concurrent sessions in batches of 8, with extracted fields
//! dummy-source capture --sessions 4 --batch-size 8 \
//!   --field dummy.value --field 'dummy.divisible[2]'
//!
//! # Single extraction
//! dummy-source extract --field 'dummy.divisible[7]' 42
//! ```
//!
//! Logging is controlled with `RUST_LOG`, e.g. `RUST_LOG=dummy_plugin=debug`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use dummy_source::plugin::{FIELDS, PLUGIN_INFO};
use dummy_source::{CaptureOpts, PluginOpts};

#[derive(Parser)]
#[command(name = "dummy-source")]
#[command(about = "Host harness for the dummy event source plugin")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the plugin identity as JSON
    Info,

    /// Print the extractable field schema as JSON
    Fields,

    /// Open sessions and print every produced event
    Capture {
        #[command(flatten)]
        opts: CaptureOpts,
    },

    /// Extract one field from a literal event payload
    Extract {
        #[command(flatten)]
        plugin: PluginOpts,

        /// Field reference (format: 'dummy.divisible[3]')
        #[arg(long)]
        field: String,

        /// Event payload, e.g. 42
        payload: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Logs go to stderr so captured events on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info => {
            println!("{}", serde_json::to_string_pretty(&PLUGIN_INFO)?);
        }
        Commands::Fields => {
            println!("{}", serde_json::to_string_pretty(&FIELDS)?);
        }
        Commands::Capture { opts } => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            dummy_source::capture(&opts, &mut out)
                .await
                .context("Capture failed")?;
        }
        Commands::Extract {
            plugin,
            field,
            payload,
        } => {
            let value = dummy_source::extract(&plugin.config, &field, &payload)?;
            println!("{value}");
        }
    }

    Ok(())
}
