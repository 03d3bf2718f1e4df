//! Ingestion Loop - byte source to controller state
//!
//! Reads one record per iteration, decodes it and applies it to the shared
//! state. The state lives inside a `watch` channel: this loop holds the only
//! sender, every observer holds a receiver and always sees a whole snapshot.

use chrono::Local;
use statum::{machine, state};
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::event_record::{read_record, DecodeError, EventRecord, RecordLayout};
use super::state::ControllerState;

/// Anything that yields raw `input_event` bytes
pub type ByteSource = Box<dyn AsyncRead + Unpin + Send>;

/// Counters reported when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    /// Records decoded
    pub records: u64,
    /// Records that changed the published state
    pub changes: u64,
}

#[state]
#[derive(Debug, Clone)]
pub enum IngestionState {
    Idle,
    Streaming,
}

#[machine]
pub struct IngestionLoop<S: IngestionState> {
    // Raw event bytes
    source: ByteSource,

    // Record shape of the source
    layout: RecordLayout,

    // Sole writer of the controller state
    publisher: watch::Sender<ControllerState>,

    summary: IngestionSummary,
}

impl<S: IngestionState> IngestionLoop<S> {
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.publisher.subscribe()
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    pub fn summary(&self) -> IngestionSummary {
        self.summary
    }
}

impl IngestionLoop<Idle> {
    pub fn create<R>(
        source: R,
        layout: RecordLayout,
        publisher: watch::Sender<ControllerState>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        debug!(
            "Creating ingestion loop for {:?} records ({} bytes)",
            layout,
            layout.size()
        );
        Self::new(
            Box::new(source),
            layout,
            publisher,
            IngestionSummary::default(),
        )
    }

    pub fn start(self) -> IngestionLoop<Streaming> {
        info!("Ingestion loop transitioning to Streaming state");
        self.transition()
    }
}

impl IngestionLoop<Streaming> {
    /// Applies one record to the published state.
    ///
    /// Observers are only woken when a field actually changed. Returns
    /// whether it did.
    pub fn ingest(&mut self, record: &EventRecord) -> bool {
        self.summary.records += 1;

        let changed = self.publisher.send_if_modified(|state| {
            let before = *state;
            state.apply(record);
            *state != before
        });

        if changed {
            self.summary.changes += 1;
            debug!(
                "Applied type={} code={} value={} at {:?}",
                record.event_type,
                record.code,
                record.value,
                record.timestamp.to_datetime()
            );
        }
        changed
    }

    /// Runs until the source fails or `cancel` fires.
    ///
    /// A short read ends the loop with [`DecodeError::Truncated`]; the state
    /// keeps whatever the last complete record left in it. Reopening the
    /// device is up to the caller.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<IngestionSummary, DecodeError> {
        info!("Starting ingestion loop");

        let mut window_records = 0u64;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(10);
        let layout = self.layout;

        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                read = read_record(&mut self.source, layout) => Some(read),
            };

            let Some(read) = read else {
                info!(
                    "Ingestion loop cancelled after {} records",
                    self.summary.records
                );
                return Ok(self.summary);
            };

            let record = match read {
                Ok(record) => record,
                Err(e) => {
                    error!(
                        "Ingestion loop stopped after {} records: {}",
                        self.summary.records, e
                    );
                    return Err(e);
                }
            };

            self.ingest(&record);
            window_records += 1;

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Ingestion stats: {} records in last {} seconds (avg {:.2}/sec)",
                    window_records,
                    log_interval.num_seconds(),
                    window_records as f64 / log_interval.num_seconds() as f64
                );
                window_records = 0;
                last_log_time = now;
            }
        }
    }
}
