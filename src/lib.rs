//! Dummy Source
//!
//! A command-line host for the dummy event source plugin. It loads the
//! plugin the way an event-monitoring framework would, opens capture
//! sessions, pulls batches of events and extracts fields from them.
//!
//! The plugin itself lives in the `dummy_plugin` crate; this crate only
//! drives it.
//!
//! # CLI Usage
//!
//! ```bash
//! # Print plugin identity and field schema
//! dummy-source info
//! dummy-source fields
//!
//! # Capture 20 events from two concurrent sessions, printing a field per event
//! dummy-source capture \
//!   --config '{"jitter": 5}' \
//!   --params '{"start": 1, "maxEvents": 20}' \
//!   --sessions 2 \
//!   --field 'dummy.divisible[3]'
//!
//! # Extract a field from a literal payload
//! dummy-source extract --field dummy.value 42
//! ```

use clap::Parser;

pub mod capture;

pub use capture::{capture, extract, CapturedEvent};
pub use dummy_plugin as plugin;

#[derive(Parser, Clone, Debug)]
pub struct PluginOpts {
    /// Plugin config JSON, e.g. '{"jitter": 10}'
    #[arg(long, default_value = "", env = "DUMMY_PLUGIN_CONFIG")]
    pub config: String,
}

#[derive(Parser, Clone, Debug)]
pub struct CaptureOpts {
    /// Plugin options
    #[command(flatten)]
    pub plugin: PluginOpts,

    /// Session open params JSON
    #[arg(long, default_value = r#"{"start": 1, "maxEvents": 20}"#)]
    pub params: String,

    /// Number of sessions to open and drive concurrently
    #[arg(long, default_value = "1")]
    pub sessions: usize,

    /// Maximum number of events pulled per batch
    #[arg(long, default_value = "16")]
    pub batch_size: usize,

    /// Fields to extract from every event (format: 'dummy.divisible[3]')
    #[arg(long = "field", value_name = "FIELD")]
    pub fields: Vec<String>,
}
