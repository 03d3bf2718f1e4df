//! Event Record Decoder - fixed-size evdev `input_event` blocks
//!
//! The kernel hands out one `struct input_event` per read:
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────┬──────────┬───────────┐
//! │ tv_sec       │ tv_usec      │ type u16 │ code u16 │ value i32 │
//! └──────────────┴──────────────┴──────────┴──────────┴───────────┘
//!   i32 | i64      i32 | i64
//! ```
//!
//! The width of the timestamp depends on the target, so the layout is chosen
//! up front ([`RecordLayout::native`] or configuration) and never guessed from
//! the stream. All fields are little-endian.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

/// Largest record any layout produces.
pub const MAX_RECORD_SIZE: usize = 24;

/// On-wire shape of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordLayout {
    /// 32-bit `timeval`: 4 + 4 + 2 + 2 + 4 = 16 bytes
    Compact,
    /// 64-bit `timeval`: 8 + 8 + 2 + 2 + 4 = 24 bytes
    Wide,
}

impl RecordLayout {
    /// Layout matching the `struct input_event` of the compilation target.
    pub const fn native() -> Self {
        if cfg!(target_pointer_width = "64") {
            RecordLayout::Wide
        } else {
            RecordLayout::Compact
        }
    }

    /// Number of bytes in one record.
    pub const fn size(self) -> usize {
        match self {
            RecordLayout::Compact => 16,
            RecordLayout::Wide => MAX_RECORD_SIZE,
        }
    }

    const fn timestamp_width(self) -> usize {
        match self {
            RecordLayout::Compact => 4,
            RecordLayout::Wide => 8,
        }
    }
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self::native()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The byte source ended before a whole record was available
    #[error("Truncated event record: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Failed to read event record: {0}")]
    Io(#[from] std::io::Error),
}

/// Kernel timestamp attached to every record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
    pub microseconds: i64,
}

impl Timestamp {
    /// Wall-clock time of the event, if the raw values form a valid instant.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let nanos = u32::try_from(self.microseconds).ok()?.checked_mul(1_000)?;
        DateTime::from_timestamp(self.seconds, nanos)
    }
}

/// One decoded `input_event`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventRecord {
    pub timestamp: Timestamp,
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

impl EventRecord {
    /// Record with a zero timestamp.
    pub const fn new(event_type: u16, code: u16, value: i32) -> Self {
        Self {
            timestamp: Timestamp {
                seconds: 0,
                microseconds: 0,
            },
            event_type,
            code,
            value,
        }
    }

    /// Decodes the first `layout.size()` bytes of `bytes`.
    ///
    /// Any bit pattern is a valid record; the only failure is running out of
    /// bytes.
    pub fn decode(bytes: &[u8], layout: RecordLayout) -> Result<Self, DecodeError> {
        let expected = layout.size();
        if bytes.len() < expected {
            return Err(DecodeError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }

        let width = layout.timestamp_width();
        let timestamp = match layout {
            RecordLayout::Compact => Timestamp {
                seconds: i32::from_le_bytes(take(bytes, 0)?).into(),
                microseconds: i32::from_le_bytes(take(bytes, width)?).into(),
            },
            RecordLayout::Wide => Timestamp {
                seconds: i64::from_le_bytes(take(bytes, 0)?),
                microseconds: i64::from_le_bytes(take(bytes, width)?),
            },
        };

        let body = width * 2;
        Ok(Self {
            timestamp,
            event_type: u16::from_le_bytes(take(bytes, body)?),
            code: u16::from_le_bytes(take(bytes, body + 2)?),
            value: i32::from_le_bytes(take(bytes, body + 4)?),
        })
    }

    /// Serializes the record the way the kernel would emit it.
    ///
    /// With [`RecordLayout::Compact`] timestamp fields outside the `i32`
    /// range saturate to `i32::MIN` / `i32::MAX`.
    pub fn to_bytes(&self, layout: RecordLayout) -> Vec<u8> {
        let mut out = Vec::with_capacity(layout.size());
        match layout {
            RecordLayout::Compact => {
                out.extend_from_slice(&saturate_i32(self.timestamp.seconds).to_le_bytes());
                out.extend_from_slice(&saturate_i32(self.timestamp.microseconds).to_le_bytes());
            }
            RecordLayout::Wide => {
                out.extend_from_slice(&self.timestamp.seconds.to_le_bytes());
                out.extend_from_slice(&self.timestamp.microseconds.to_le_bytes());
            }
        }
        out.extend_from_slice(&self.event_type.to_le_bytes());
        out.extend_from_slice(&self.code.to_le_bytes());
        out.extend_from_slice(&self.value.to_le_bytes());
        out
    }
}

fn saturate_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

fn take<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N], DecodeError> {
    bytes
        .get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(DecodeError::Truncated {
            expected: offset + N,
            actual: bytes.len(),
        })
}

/// Reads exactly one record from `reader` and decodes it.
///
/// A source that ends before a full record (including one that is already at
/// end-of-stream) yields [`DecodeError::Truncated`]. Nothing is retried.
pub async fn read_record<R>(reader: &mut R, layout: RecordLayout) -> Result<EventRecord, DecodeError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let expected = layout.size();
    let mut buf = [0u8; MAX_RECORD_SIZE];
    let mut filled = 0;

    while filled < expected {
        let read = reader.read(&mut buf[filled..expected]).await?;
        if read == 0 {
            trace!("Byte source ended after {} of {} bytes", filled, expected);
            return Err(DecodeError::Truncated {
                expected,
                actual: filled,
            });
        }
        filled += read;
    }

    EventRecord::decode(&buf[..expected], layout)
}
