//! Status reporting toward the operator surface.
//!
//! The surface itself (a small always-on-top window with an abort-on-hover
//! gesture) lives outside this crate; the contract here is a one-way,
//! best-effort text channel plus a shared abort flag polled on every update.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use tracing::info;

use crate::errors::AutomationError;

/// Cooperative cancellation token, created per task and handed to both the
/// worker and the surface. Checked only at status updates, never preemptive.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where step text goes. `update` returns `Aborted` when the operator has
/// signaled cancellation; the workflow treats that as terminal.
pub trait StatusSink {
    fn update(&self, message: &str) -> Result<(), AutomationError>;
}

/// Sink backed by an mpsc channel to the surface thread. Messages are
/// fire-and-forget: a gone receiver is not an error, the run just continues
/// unobserved.
pub struct ChannelSink {
    tx: Sender<String>,
    abort: AbortFlag,
}

impl ChannelSink {
    pub fn new(tx: Sender<String>, abort: AbortFlag) -> Self {
        Self { tx, abort }
    }
}

impl StatusSink for ChannelSink {
    fn update(&self, message: &str) -> Result<(), AutomationError> {
        if self.abort.is_set() {
            return Err(AutomationError::Aborted);
        }
        info!("{message}");
        let _ = self.tx.send(message.to_string());
        Ok(())
    }
}

/// Headless sink: status goes to the log only. Still honors the abort flag so
/// a supervising process can cancel a headless run.
pub struct LogSink {
    abort: AbortFlag,
}

impl LogSink {
    pub fn new(abort: AbortFlag) -> Self {
        Self { abort }
    }
}

impl StatusSink for LogSink {
    fn update(&self, message: &str) -> Result<(), AutomationError> {
        if self.abort.is_set() {
            return Err(AutomationError::Aborted);
        }
        info!("{message}");
        Ok(())
    }
}
