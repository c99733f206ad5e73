//! Capture sessions and batch production.

use crate::config::OpenParams;
use crate::error::Result;
use crate::event::{now_nanos, Batch, BatchStatus, EventWriter};
use crate::generator::{Generator, PLUGIN_NAME};

/// One open capture session.
///
/// A session owns its production state; nothing is shared with other
/// sessions except the generator it borrows for each batch. Producing from
/// the same session concurrently needs `&mut`, so it cannot happen.
#[derive(Debug)]
pub struct Session {
    /// Raw params the session was opened with
    open_params: String,
    max_events: u64,
    /// Events produced so far; never exceeds `max_events`
    emitted: u64,
    /// Value carried by the most recent event
    sample: u64,
}

impl Session {
    pub(crate) fn open(raw_params: &str) -> Result<Self> {
        let params = OpenParams::parse(raw_params)?;
        Ok(Self {
            open_params: raw_params.to_string(),
            max_events: params.max_events,
            emitted: 0,
            sample: params.start,
        })
    }

    pub fn open_params(&self) -> &str {
        &self.open_params
    }

    pub fn max_events(&self) -> u64 {
        self.max_events
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn sample(&self) -> u64 {
        self.sample
    }

    pub fn is_exhausted(&self) -> bool {
        self.emitted >= self.max_events
    }

    /// Fill the leading slots of `events` with new events.
    ///
    /// Each event advances the sample by `1 + [0, jitter]`, is stamped with
    /// the current time and carries the sample as decimal ASCII. Production
    /// stops when `events` is full or the session runs out of events. The
    /// returned status is [`BatchStatus::Exhausted`] once the session has
    /// produced `maxEvents` events; from then on every call returns an empty
    /// exhausted batch.
    ///
    /// A failed payload write aborts the batch with [`PluginError::Io`].
    /// Slots written before the failure stay valid and the session state
    /// only counts those, so calling again resumes after the last good event.
    ///
    /// [`PluginError::Io`]: crate::PluginError::Io
    pub fn next_batch<W: EventWriter>(
        &mut self,
        generator: &Generator,
        events: &mut [W],
    ) -> Result<Batch> {
        tracing::debug!("[{PLUGIN_NAME}] NextBatch, capacity={}", events.len());

        if self.is_exhausted() {
            return Ok(Batch {
                count: 0,
                status: BatchStatus::Exhausted,
            });
        }

        let mut count = 0;
        for event in events.iter_mut() {
            if self.is_exhausted() {
                break;
            }
            let sample = self.sample.saturating_add(generator.next_increment());
            event.set_timestamp(now_nanos());
            event.write_payload(sample.to_string().as_bytes())?;

            self.sample = sample;
            self.emitted += 1;
            count += 1;
        }

        let status = if self.is_exhausted() {
            tracing::info!(
                "[{PLUGIN_NAME}] Session exhausted after {} events, last sample {}",
                self.emitted,
                self.sample
            );
            BatchStatus::Exhausted
        } else {
            BatchStatus::More
        };
        Ok(Batch { count, status })
    }

    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::debug!("[{PLUGIN_NAME}] Close");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginConfig;
    use crate::event::{EventBuffer, TIMESTAMP_UNSET};
    use crate::PluginError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io;

    fn generator(jitter: u64) -> Generator {
        Generator::with_rng(PluginConfig { jitter }, StdRng::seed_from_u64(7))
    }

    fn samples(events: &[EventBuffer]) -> Vec<u64> {
        events
            .iter()
            .map(|e| std::str::from_utf8(e.data()).unwrap().parse().unwrap())
            .collect()
    }

    /// Accepts `remaining` payloads, then fails every write.
    struct FlakyWriter {
        remaining: usize,
        inner: EventBuffer,
    }

    impl EventWriter for FlakyWriter {
        fn set_timestamp(&mut self, ts: u64) {
            self.inner.set_timestamp(ts);
        }

        fn write_payload(&mut self, payload: &[u8]) -> io::Result<()> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
            }
            self.remaining -= 1;
            self.inner.write_payload(payload)
        }
    }

    #[test]
    fn test_open_initial_state() {
        let generator = generator(0);
        let session = generator.open(r#"{"start": 10, "maxEvents": 3}"#).unwrap();
        assert_eq!(session.open_params(), r#"{"start": 10, "maxEvents": 3}"#);
        assert_eq!(session.max_events(), 3);
        assert_eq!(session.emitted(), 0);
        assert_eq!(session.sample(), 10);
        assert!(!session.is_exhausted());
    }

    #[test]
    fn test_zero_jitter_sequence() {
        let generator = generator(0);
        let mut session = generator.open(r#"{"start": 100, "maxEvents": 5}"#).unwrap();
        let mut events = vec![EventBuffer::default(); 5];

        let batch = session.next_batch(&generator, &mut events).unwrap();
        assert_eq!(batch.count, 5);
        assert_eq!(samples(&events), vec![101, 102, 103, 104, 105]);
        for event in &events {
            assert_ne!(event.timestamp(), TIMESTAMP_UNSET);
        }
    }

    #[test]
    fn test_capacity_limits_batch() {
        let generator = generator(0);
        let mut session = generator.open(r#"{"start": 0, "maxEvents": 10}"#).unwrap();
        let mut events = vec![EventBuffer::default(); 4];

        let batch = session.next_batch(&generator, &mut events).unwrap();
        assert_eq!(
            batch,
            Batch {
                count: 4,
                status: BatchStatus::More
            }
        );
        assert_eq!(session.emitted(), 4);
        assert_eq!(session.sample(), 4);
    }

    #[test]
    fn test_zero_capacity() {
        let generator = generator(0);
        let mut session = generator.open(r#"{"start": 0, "maxEvents": 2}"#).unwrap();
        let mut events: Vec<EventBuffer> = Vec::new();

        let batch = session.next_batch(&generator, &mut events).unwrap();
        assert_eq!(batch.count, 0);
        assert_eq!(batch.status, BatchStatus::More);
        assert_eq!(session.emitted(), 0);
    }

    #[test]
    fn test_exhaustion_is_sticky() {
        let generator = generator(3);
        let mut session = generator.open(r#"{"start": 1, "maxEvents": 7}"#).unwrap();
        let mut events = vec![EventBuffer::default(); 3];

        let counts: Vec<usize> = (0..3)
            .map(|_| session.next_batch(&generator, &mut events).unwrap().count)
            .collect();
        assert_eq!(counts, vec![3, 3, 1]);
        assert!(session.is_exhausted());

        let sample = session.sample();
        for _ in 0..5 {
            let batch = session.next_batch(&generator, &mut events).unwrap();
            assert_eq!(batch.count, 0);
            assert!(batch.is_exhausted());
        }
        assert_eq!(session.sample(), sample);
        assert_eq!(session.emitted(), 7);
    }

    #[test]
    fn test_zero_max_events() {
        let generator = generator(0);
        let mut session = generator.open(r#"{"start": 1, "maxEvents": 0}"#).unwrap();
        let mut events = vec![EventBuffer::default(); 2];

        let batch = session.next_batch(&generator, &mut events).unwrap();
        assert_eq!(batch.count, 0);
        assert!(batch.is_exhausted());
        assert_eq!(events[0], EventBuffer::default());
    }

    #[test]
    fn test_write_failure_keeps_completed_events() {
        let generator = generator(0);
        let mut session = generator.open(r#"{"start": 0, "maxEvents": 10}"#).unwrap();
        let mut events: Vec<FlakyWriter> = (0..4)
            .map(|i| FlakyWriter {
                remaining: usize::from(i < 2),
                inner: EventBuffer::default(),
            })
            .collect();

        let err = session.next_batch(&generator, &mut events).unwrap_err();
        assert!(matches!(err, PluginError::Io(_)));
        assert_eq!(session.emitted(), 2);
        assert_eq!(session.sample(), 2);
        assert_eq!(events[0].inner.data(), b"1");
        assert_eq!(events[1].inner.data(), b"2");

        // A retry with working slots picks up where the last good event left off.
        let mut retry = vec![EventBuffer::default(); 2];
        session.next_batch(&generator, &mut retry).unwrap();
        assert_eq!(samples(&retry), vec![3, 4]);
    }

    #[test]
    fn test_sample_saturates() {
        let generator = generator(0);
        let params = format!(r#"{{"start": {}, "maxEvents": 2}}"#, u64::MAX - 1);
        let mut session = generator.open(&params).unwrap();
        let mut events = vec![EventBuffer::default(); 2];

        session.next_batch(&generator, &mut events).unwrap();
        assert_eq!(samples(&events), vec![u64::MAX, u64::MAX]);
    }
}
