//! Plugin-wide state: configuration, the shared random source, metadata,
//! rendering and field extraction.

use crate::config::PluginConfig;
use crate::error::{PluginError, Result};
use crate::event::now_nanos;
use crate::fields::{decode_sample, ExtractRequest, Field, FieldDescriptor, FieldValue, FIELDS};
use crate::session::Session;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};

pub const PLUGIN_NAME: &str = "dummy";

/// Identity the plugin reports to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub contact: &'static str,
    pub version: &'static str,
    pub required_api_version: &'static str,
    pub event_source: &'static str,
}

pub const PLUGIN_INFO: PluginInfo = PluginInfo {
    id: 3,
    name: PLUGIN_NAME,
    description: "Reference plugin for educational purposes",
    contact: "github.com/falcosecurity/plugins",
    version: "0.1.0",
    required_api_version: "0.2.0",
    event_source: "dummy",
};

/// One loaded instance of the plugin.
///
/// Sessions opened from a generator borrow it for every batch so that they
/// all draw from the same random source. The source sits behind a mutex, so
/// a generator can be shared across threads (e.g. in an `Arc`) while
/// several sessions produce concurrently.
pub struct Generator {
    config: PluginConfig,
    rng: Mutex<StdRng>,
}

impl Generator {
    /// Initialize the plugin from its raw JSON config.
    ///
    /// The random source is seeded from the current time, so sample
    /// sequences differ between runs unless jitter is 0.
    pub fn init(raw_config: &str) -> Result<Self> {
        tracing::debug!("[{PLUGIN_NAME}] Init, config={raw_config}");
        let config = PluginConfig::parse(raw_config)?;
        let generator = Self::with_rng(config, StdRng::seed_from_u64(now_nanos()));
        tracing::info!("[{PLUGIN_NAME}] Initialized with jitter {}", config.jitter);
        Ok(generator)
    }

    /// Create a generator with an explicit random source.
    pub fn with_rng(config: PluginConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn info(&self) -> &'static PluginInfo {
        &PLUGIN_INFO
    }

    pub fn config(&self) -> PluginConfig {
        self.config
    }

    /// The fixed field schema, ordered by field id.
    pub fn fields(&self) -> &'static [FieldDescriptor] {
        &FIELDS
    }

    /// Open a new capture session from raw JSON params.
    pub fn open(&self, raw_params: &str) -> Result<Session> {
        tracing::debug!("[{PLUGIN_NAME}] Open, params={raw_params}");
        Session::open(raw_params)
    }

    /// Amount to add to a session's sample for its next event: `1 + [0, jitter]`.
    pub(crate) fn next_increment(&self) -> u64 {
        let jitter = self.config.jitter;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random_range(0..=jitter).saturating_add(1)
    }

    /// Human-readable rendering of an event payload.
    pub fn render(&self, payload: &[u8]) -> Result<String> {
        tracing::debug!("[{PLUGIN_NAME}] String");
        let raw = std::str::from_utf8(payload)
            .map_err(|e| PluginError::MalformedPayload(format!("payload is not UTF-8: {e}")))?;
        Ok(format!("{{\"sample\": \"{raw}\"}}"))
    }

    /// Extract one field from an event payload.
    pub fn extract(&self, field_id: u64, arg: Option<&str>, payload: &[u8]) -> Result<FieldValue> {
        tracing::debug!("[{PLUGIN_NAME}] Extract, field={field_id}");
        let (raw, sample) = decode_sample(payload)?;
        extract_decoded(field_id, arg, raw, sample)
    }

    /// Extract several fields from one event payload, decoding it once.
    pub fn extract_fields(
        &self,
        requests: &[ExtractRequest],
        payload: &[u8],
    ) -> Result<Vec<FieldValue>> {
        tracing::debug!("[{PLUGIN_NAME}] Extract, {} fields", requests.len());
        let (raw, sample) = decode_sample(payload)?;
        requests
            .iter()
            .map(|req| extract_decoded(req.field_id, req.arg.as_deref(), raw, sample))
            .collect()
    }

    pub fn destroy(self) {
        drop(self);
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        tracing::debug!("[{PLUGIN_NAME}] Destroy");
    }
}

fn extract_decoded(field_id: u64, arg: Option<&str>, raw: &str, sample: u64) -> Result<FieldValue> {
    let field =
        Field::from_id(field_id).ok_or_else(|| PluginError::UnknownField(field_id.to_string()))?;
    field.extract(arg, raw, sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(jitter: u64) -> Generator {
        Generator::with_rng(PluginConfig { jitter }, StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_init_defaults() {
        let generator = Generator::init("").unwrap();
        assert_eq!(generator.config().jitter, 10);
    }

    #[test]
    fn test_init_rejects_malformed_config() {
        assert!(matches!(
            Generator::init("{jitter"),
            Err(PluginError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_zero_jitter_increment_is_one() {
        let generator = generator(0);
        for _ in 0..100 {
            assert_eq!(generator.next_increment(), 1);
        }
    }

    #[test]
    fn test_increment_bounds() {
        let generator = generator(4);
        let mut seen = [false; 5];
        for _ in 0..1000 {
            let inc = generator.next_increment();
            assert!((1..=5).contains(&inc), "increment {inc}");
            seen[(inc - 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "every increment in [1, 5] should occur");
    }

    #[test]
    fn test_increment_saturates() {
        let generator = generator(u64::MAX);
        assert!(generator.next_increment() >= 1);
    }

    #[test]
    fn test_info() {
        let generator = generator(0);
        let info = generator.info();
        assert_eq!(info.id, 3);
        assert_eq!(info.name, "dummy");
        assert_eq!(info.event_source, "dummy");

        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["requiredApiVersion"], "0.2.0");
        assert_eq!(json["eventSource"], "dummy");
    }

    #[test]
    fn test_render() {
        let generator = generator(0);
        assert_eq!(generator.render(b"42").unwrap(), r#"{"sample": "42"}"#);
        assert!(matches!(
            generator.render(&[0xc3, 0x28]),
            Err(PluginError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_extract_unknown_field() {
        let generator = generator(0);
        match generator.extract(99, None, b"42").unwrap_err() {
            PluginError::UnknownField(name) => assert_eq!(name, "99"),
            other => panic!("Expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_decodes_before_dispatch() {
        let generator = generator(0);
        assert!(matches!(
            generator.extract(2, None, b"abc"),
            Err(PluginError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_extract_fields_in_order() {
        let generator = generator(0);
        let requests = vec![
            ExtractRequest::new(2, None),
            ExtractRequest::new(0, Some("3")),
            ExtractRequest::new(1, None),
        ];
        let values = generator.extract_fields(&requests, b"12").unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Str("12".to_string()),
                FieldValue::U64(1),
                FieldValue::U64(12)
            ]
        );
    }

    #[test]
    fn test_extract_fields_stops_at_first_error() {
        let generator = generator(0);
        let requests = vec![ExtractRequest::new(1, None), ExtractRequest::new(7, None)];
        assert!(matches!(
            generator.extract_fields(&requests, b"12"),
            Err(PluginError::UnknownField(_))
        ));
    }
}
