//! Capture driver: pulls events from plugin sessions and extracts fields.

use crate::CaptureOpts;
use anyhow::{bail, Context, Result};
use dummy_plugin::{EventBuffer, ExtractRequest, FieldValue, Generator, Session};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

const CHANNEL_CAPACITY: usize = 1024;

/// One event pulled from a session, with its rendering and extracted fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    /// Index of the session that produced the event
    pub session: usize,
    pub timestamp: u64,
    pub rendered: String,
    /// Field values, in the order the fields were requested
    pub fields: Vec<(String, FieldValue)>,
}

impl CapturedEvent {
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "session={} ts={} {}",
            self.session, self.timestamp, self.rendered
        );
        for (name, value) in &self.fields {
            line.push_str(&format!(" {name}={value}"));
        }
        line
    }
}

/// Run a capture and write one line per event to `out`.
///
/// All sessions are opened from a single plugin instance before any of them
/// produces, then each is drained on its own blocking task. Lines from
/// different sessions interleave in arrival order.
///
/// Returns the total number of events captured.
pub async fn capture<W: Write>(opts: &CaptureOpts, out: &mut W) -> Result<u64> {
    if opts.sessions == 0 {
        bail!("--sessions must be at least 1");
    }
    if opts.batch_size == 0 {
        bail!("--batch-size must be at least 1");
    }

    let generator =
        Arc::new(Generator::init(&opts.plugin.config).context("Failed to initialize plugin")?);
    let requests = parse_fields(&opts.fields)?;

    let sessions = (0..opts.sessions)
        .map(|_| generator.open(&opts.params))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to open session with params {}", opts.params))?;
    info!(
        "Opened {} session(s) with params {}",
        sessions.len(),
        opts.params
    );

    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
    let handles: Vec<_> = sessions
        .into_iter()
        .enumerate()
        .map(|(idx, session)| {
            let generator = Arc::clone(&generator);
            let requests = requests.clone();
            let batch_size = opts.batch_size;
            let tx = tx.clone();
            tokio::task::spawn_blocking(move || {
                drain_session(idx, &generator, session, &requests, batch_size, &tx)
            })
        })
        .collect();
    drop(tx);

    while let Some(event) = rx.recv().await {
        writeln!(out, "{}", event.to_line()).context("Failed to write event")?;
    }

    let mut total = 0;
    for handle in handles {
        total += handle.await.context("Capture task panicked")??;
    }
    info!("Captured {total} events");
    Ok(total)
}

fn parse_fields(references: &[String]) -> Result<Vec<(String, ExtractRequest)>> {
    references
        .iter()
        .map(|reference| {
            let request = ExtractRequest::parse(reference)
                .with_context(|| format!("Invalid field reference: {reference}"))?;
            Ok((reference.trim().to_string(), request))
        })
        .collect()
}

fn drain_session(
    idx: usize,
    generator: &Generator,
    mut session: Session,
    requests: &[(String, ExtractRequest)],
    batch_size: usize,
    tx: &mpsc::Sender<CapturedEvent>,
) -> Result<u64> {
    let extract: Vec<ExtractRequest> = requests.iter().map(|(_, r)| r.clone()).collect();
    let mut events = vec![EventBuffer::default(); batch_size];
    let mut captured = 0;

    loop {
        let batch = session
            .next_batch(generator, &mut events)
            .with_context(|| format!("Session {idx} failed to produce a batch"))?;
        debug!("Session {idx} produced a batch of {} events", batch.count);

        for event in &events[..batch.count] {
            let values = generator.extract_fields(&extract, event.data())?;
            let captured_event = CapturedEvent {
                session: idx,
                timestamp: event.timestamp(),
                rendered: generator.render(event.data())?,
                fields: requests
                    .iter()
                    .map(|(name, _)| name.clone())
                    .zip(values)
                    .collect(),
            };
            if tx.blocking_send(captured_event).is_err() {
                bail!("Capture output closed before session {idx} finished");
            }
            captured += 1;
        }

        if batch.is_exhausted() {
            break;
        }
    }

    session.close();
    Ok(captured)
}

/// Extract one field, given as a reference like `dummy.divisible[3]`, from a literal payload.
pub fn extract(config: &str, reference: &str, payload: &str) -> Result<FieldValue> {
    let generator = Generator::init(config).context("Failed to initialize plugin")?;
    let request = ExtractRequest::parse(reference)
        .with_context(|| format!("Invalid field reference: {reference}"))?;
    let value = generator
        .extract(request.field_id, request.arg.as_deref(), payload.as_bytes())
        .with_context(|| format!("Failed to extract {reference} from {payload:?}"))?;
    Ok(value)
}
