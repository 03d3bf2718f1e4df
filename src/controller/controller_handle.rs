//! Controller Handle - owns the ingestion task
//!
//! Wires a byte source to a fresh [`ControllerState`], spawns the ingestion
//! loop as a tokio task and hands out receivers to observers.
//!
//! ```text
//! ByteSource ─[input_event]→ IngestionLoop ─[watch]→ Monitor / any observer
//! ```

use std::path::{Path, PathBuf};

use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::event_record::{DecodeError, RecordLayout};
use super::ingestion::{IngestionLoop, IngestionSummary};
use super::state::ControllerState;

/// Settings for the ingestion side
#[derive(Clone, Debug, Default)]
pub struct ControllerSettings {
    /// Record shape of the byte source. Defaults to the target's native
    /// `struct input_event`.
    pub record_layout: RecordLayout,
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Failed to open device {path}: {source}")]
    DeviceError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The byte stream ended or failed
    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("Ingestion task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

/// Handle to a running ingestion task
///
/// Dropping the handle does not stop the task; call [`shutdown`](Self::shutdown)
/// or cancel the token from [`cancellation_token`](Self::cancellation_token).
pub struct ControllerHandle {
    state_receiver: watch::Receiver<ControllerState>,
    cancel: CancellationToken,
    task: JoinHandle<Result<IngestionSummary, DecodeError>>,
}

impl ControllerHandle {
    /// Spawns the ingestion loop over `source`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R>(source: R, settings: Option<ControllerSettings>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let settings = settings.unwrap_or_default();
        info!("Initializing controller with settings: {:?}", settings);

        let (state_sender, state_receiver) = watch::channel(ControllerState::new());
        let cancel = CancellationToken::new();

        let ingestion = IngestionLoop::create(source, settings.record_layout, state_sender);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let mut streaming = ingestion.start();
            let result = streaming.run(task_cancel).await;
            match &result {
                Ok(summary) => info!("Ingestion task finished: {:?}", summary),
                Err(e) => error!("Ingestion task terminated with error: {}", e),
            }
            result
        });

        debug!("Ingestion task spawned");
        Self {
            state_receiver,
            cancel,
            task,
        }
    }

    /// Opens an evdev node and spawns the ingestion loop over it.
    pub async fn open(
        path: impl AsRef<Path>,
        settings: Option<ControllerSettings>,
    ) -> Result<Self, ControllerError> {
        let path = path.as_ref();
        let device = open_device(path).await?;
        Ok(Self::spawn(device, settings))
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        debug!("New subscriber to controller state");
        self.state_receiver.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Asks the ingestion loop to stop after the read in flight.
    pub fn shutdown(&self) {
        info!("Shutting down ingestion");
        self.cancel.cancel();
    }

    /// Waits for the ingestion task to end.
    pub async fn join(self) -> Result<IngestionSummary, ControllerError> {
        Ok(self.task.await??)
    }
}

/// Opens an evdev device node for reading.
pub async fn open_device(path: &Path) -> Result<tokio::fs::File, ControllerError> {
    info!("Opening input device {}", path.display());
    tokio::fs::File::open(path)
        .await
        .map_err(|source| ControllerError::DeviceError {
            path: path.to_path_buf(),
            source,
        })
}
