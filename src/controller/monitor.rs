//! Monitor - prints the controller state while it changes
//!
//! Read-only observer of the state published by the ingestion loop. It never
//! touches the state itself; it renders snapshots into a line-oriented sink.

use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::state::{ControllerState, RenderOptions};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Print on a fixed timer, changed or not
    #[default]
    Interval,
    /// Print whenever the state changes
    OnChange,
}

#[derive(Clone, Debug)]
pub struct MonitorSettings {
    pub mode: RenderMode,
    pub interval_ms: u64,
    pub options: RenderOptions,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            mode: RenderMode::Interval,
            interval_ms: 100, // 10 Hz
            options: RenderOptions::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Failed to write state: {0}")]
    WriteError(#[from] std::io::Error),
}

pub struct Monitor<W> {
    receiver: watch::Receiver<ControllerState>,
    settings: MonitorSettings,
    sink: W,
    lines: u64,
}

impl<W: Write> Monitor<W> {
    pub fn new(
        receiver: watch::Receiver<ControllerState>,
        settings: MonitorSettings,
        sink: W,
    ) -> Self {
        Self {
            receiver,
            settings,
            sink,
            lines: 0,
        }
    }

    /// Renders until `cancel` fires or the ingestion side goes away.
    ///
    /// Returns the number of lines written.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<u64, MonitorError> {
        info!(
            "Starting monitor in {:?} mode ({} ms)",
            self.settings.mode, self.settings.interval_ms
        );
        match self.settings.mode {
            RenderMode::Interval => self.run_interval(cancel).await?,
            RenderMode::OnChange => self.run_on_change(cancel).await?,
        }
        info!("Monitor stopped after {} lines", self.lines);
        Ok(self.lines)
    }

    async fn run_interval(&mut self, cancel: CancellationToken) -> Result<(), MonitorError> {
        let period = Duration::from_millis(self.settings.interval_ms.max(1));
        let mut interval_timer = tokio::time::interval(period);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                _ = interval_timer.tick() => {}
            }

            self.emit()?;

            if self.receiver.has_changed().is_err() {
                debug!("State publisher closed");
                return Ok(());
            }
        }
    }

    async fn run_on_change(&mut self, cancel: CancellationToken) -> Result<(), MonitorError> {
        loop {
            let changed = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                changed = self.receiver.changed() => changed,
            };

            if changed.is_err() {
                debug!("State publisher closed");
                return Ok(());
            }
            self.emit()?;
        }
    }

    fn emit(&mut self) -> Result<(), MonitorError> {
        let line = self.receiver.borrow_and_update().render(&self.settings.options);
        writeln!(self.sink, "{}", line)?;
        self.sink.flush()?;
        self.lines += 1;
        Ok(())
    }

    pub fn into_sink(self) -> W {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::dispatch::{EV_ABS, EV_KEY};
    use crate::controller::event_record::EventRecord;

    fn pressed_select() -> ControllerState {
        let mut state = ControllerState::new();
        state.apply(&EventRecord::new(EV_KEY, 288, 1));
        state
    }

    #[tokio::test]
    async fn on_change_prints_last_state_before_close() {
        let (tx, rx) = watch::channel(ControllerState::new());
        let settings = MonitorSettings {
            mode: RenderMode::OnChange,
            ..Default::default()
        };
        let mut monitor = Monitor::new(rx, settings, Vec::new());

        tx.send_replace(pressed_select());
        drop(tx);

        let lines = monitor.run(CancellationToken::new()).await.unwrap();
        assert_eq!(lines, 1);
        let output = String::from_utf8(monitor.into_sink()).unwrap();
        assert_eq!(output, "Sixaxis{select}\n");
    }

    #[tokio::test]
    async fn interval_prints_once_then_notices_close() {
        let (tx, rx) = watch::channel(ControllerState::new());
        let mut monitor = Monitor::new(rx, MonitorSettings::default(), Vec::new());

        let mut state = ControllerState::new();
        state.apply(&EventRecord::new(EV_ABS, 0, -5));
        tx.send_replace(state);
        drop(tx);

        let lines = monitor.run(CancellationToken::new()).await.unwrap();
        assert_eq!(lines, 1);
        let output = String::from_utf8(monitor.into_sink()).unwrap();
        assert_eq!(output, "Sixaxis{LX=-05}\n");
    }

    #[tokio::test]
    async fn cancelled_monitor_writes_nothing() {
        let (_tx, rx) = watch::channel(pressed_select());
        let mut monitor = Monitor::new(rx, MonitorSettings::default(), Vec::new());

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(monitor.run(cancel).await.unwrap(), 0);
        assert!(monitor.into_sink().is_empty());
    }
}
