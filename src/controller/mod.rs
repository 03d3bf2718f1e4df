//! Controller subsystem for Sixaxis evdev input
//!
//! Turns raw `input_event` records into a live [`ControllerState`]:
//!
//! 1. [`event_record`] - fixed-size record decoding
//! 2. [`dispatch`] - `(type, code)` to field tables
//! 3. [`state`] - the snapshot and its rendering
//! 4. [`ingestion`] - the read/decode/apply loop
//! 5. [`controller_handle`] - task lifecycle
//! 6. [`monitor`] - read-only observer that prints snapshots
//!
//! # Architecture
//!
//! ```text
//! /dev/input/eventN ──► IngestionLoop ──watch──► Monitor
//!                       (decode, apply)          (render)
//! ```

pub mod controller_handle;
pub mod dispatch;
pub mod event_record;
pub mod ingestion;
pub mod monitor;
pub mod state;

pub use controller_handle::{open_device, ControllerError, ControllerHandle, ControllerSettings};
pub use dispatch::{AnalogButton, DigitalButton, FieldSelector, OrientationAxis, StickAxis, Update};
pub use event_record::{read_record, DecodeError, EventRecord, RecordLayout, Timestamp};
pub use ingestion::{IngestionLoop, IngestionSummary};
pub use monitor::{Monitor, MonitorError, MonitorSettings, RenderMode};
pub use state::{ControllerState, OrientationPolicy, RenderOptions};
