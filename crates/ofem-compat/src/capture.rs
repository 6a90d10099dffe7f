//! Console capture for native calls.
//!
//! The routine writes lines into a bounded channel while a scoped consumer
//! thread forwards them to `tracing` and collects them. The consumer is
//! joined before the call returns, so no output outlives the call.

use std::sync::mpsc::{SyncSender, sync_channel};
use std::thread;

use tracing::info;

use crate::bridge::NativeRoutine;

/// Lines buffered before a writing routine blocks.
pub const CHANNEL_CAPACITY: usize = 256;

/// Write end handed to a native routine. Routines only ever borrow it, so
/// no sender survives the call and the consumer always terminates.
#[derive(Debug)]
pub struct OutputSink {
    tx: SyncSender<String>,
}

impl OutputSink {
    /// Send one line of output. Multi-line text is split. Output sent after
    /// the consumer has gone is dropped.
    pub fn write_line(&self, text: impl AsRef<str>) {
        for line in text.as_ref().lines() {
            if self.tx.send(line.to_string()).is_err() {
                return;
            }
        }
    }
}

/// Run `call` with a fresh sink and return its result with every captured
/// line, in order.
pub fn capture_output<T>(routine: NativeRoutine, call: impl FnOnce(&OutputSink) -> T) -> (T, Vec<String>) {
    let (tx, rx) = sync_channel::<String>(CHANNEL_CAPACITY);
    thread::scope(|scope| {
        let consumer = scope.spawn(move || {
            let mut lines = Vec::new();
            for line in rx {
                info!(target: "ofem::native", routine = routine.symbol(), "{line}");
                lines.push(line);
            }
            lines
        });

        let sink = OutputSink { tx };
        let value = call(&sink);
        drop(sink);
        let lines = consumer.join().unwrap_or_default();
        (value, lines)
    })
}
