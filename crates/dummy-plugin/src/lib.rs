//! Dummy event source plugin.
//!
//! This crate implements a synthetic data source for a host event-monitoring
//! framework. It produces a stream of numeric events on demand and exposes a
//! small set of named fields that can be extracted back out of each event.
//!
//! # Architecture
//!
//! ```text
//!  plugin config (JSON)        open params (JSON)
//!         │                           │
//!         ▼                           ▼
//! ┌─────────────────┐  open   ┌─────────────────┐
//! │    Generator    │────────▶│     Session     │
//! │                 │         │                 │
//! │  - jitter       │◀────────│  - sample       │
//! │  - rng (shared) │  rng    │  - emitted      │
//! └────────┬────────┘         └────────┬────────┘
//!          │ extract / render          │ next_batch
//!          ▼                           ▼
//!    FieldValue / String        EventWriter slots
//! ```
//!
//! # Example
//!
//! ```rust
//! use dummy_plugin::{BatchStatus, EventBuffer, Generator, FieldValue};
//!
//! let generator = Generator::init(r#"{"jitter": 0}"#).unwrap();
//! let mut session = generator.open(r#"{"start": 1, "maxEvents": 3}"#).unwrap();
//!
//! let mut events = vec![EventBuffer::default(); 8];
//! let batch = session.next_batch(&generator, &mut events).unwrap();
//! assert_eq!(batch.count, 3);
//! assert_eq!(batch.status, BatchStatus::Exhausted);
//!
//! assert_eq!(generator.render(events[0].data()).unwrap(), r#"{"sample": "2"}"#);
//! assert_eq!(
//!     generator.extract(1, None, events[2].data()).unwrap(),
//!     FieldValue::U64(4)
//! );
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod fields;
pub mod generator;
pub mod session;


// Re-exports for convenience
pub use config::{OpenParams, PluginConfig, DEFAULT_JITTER};
pub use error::{PluginError, Result};
pub use event::{Batch, BatchStatus, EventBuffer, EventWriter, TIMESTAMP_UNSET};
pub use fields::{ExtractRequest, Field, FieldDescriptor, FieldType, FieldValue, FIELDS};
pub use generator::{Generator, PluginInfo, PLUGIN_INFO, PLUGIN_NAME};
pub use session::Session;
