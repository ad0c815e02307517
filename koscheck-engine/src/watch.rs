//! The tail, resolve and report loop.

use std::time::Duration;

use koscheck_core::KosResult;
use koscheck_remote::RemoteLookup;

use crate::processor::{EntryProcessor, EntryReport};
use crate::tailer::{LineRead, LogTailer, TailEntry};

/// Wait between polls when the log has nothing new.
pub const DEFAULT_IDLE_DELAY: Duration = Duration::from_secs(1);

/// Receives every processed request.
pub trait EntryHandler {
    fn on_entry(&mut self, entry: &TailEntry, report: &EntryReport);
}

impl<F> EntryHandler for F
where
    F: FnMut(&TailEntry, &EntryReport),
{
    fn on_entry(&mut self, entry: &TailEntry, report: &EntryReport) {
        self(entry, report)
    }
}

pub struct KosWatcher<R: RemoteLookup> {
    tailer: LogTailer,
    processor: EntryProcessor<R>,
    idle_delay: Duration,
}

impl<R: RemoteLookup> KosWatcher<R> {
    pub fn new(tailer: LogTailer, processor: EntryProcessor<R>) -> Self {
        Self {
            tailer,
            processor,
            idle_delay: DEFAULT_IDLE_DELAY,
        }
    }

    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay = delay;
        self
    }

    pub fn tailer(&self) -> &LogTailer {
        &self.tailer
    }

    pub fn processor(&self) -> &EntryProcessor<R> {
        &self.processor
    }

    /// Handle at most one line. Returns `false` when the log had nothing
    /// new, `true` when a line was consumed.
    pub async fn step<H: EntryHandler>(&mut self, handler: &mut H) -> KosResult<bool> {
        match self.tailer.poll_line()? {
            LineRead::Pending => Ok(false),
            LineRead::Skipped => Ok(true),
            LineRead::Entry(entry) => {
                let report = self.processor.process(&entry.names).await;
                handler.on_entry(&entry, &report);
                Ok(true)
            }
        }
    }

    /// Run until the log becomes unreadable. Chatter lines are consumed
    /// back to back; only an idle log waits `idle_delay`.
    pub async fn run<H: EntryHandler>(&mut self, handler: &mut H) -> KosResult<()> {
        tracing::info!(path = %self.tailer.path().display(), "Watching chat log");
        loop {
            if !self.step(handler).await? {
                tokio::time::sleep(self.idle_delay).await;
            }
        }
    }
}
