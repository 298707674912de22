//! Target-application lifecycle.
//!
//! The workflow controller owns exactly one `AppHandle` per task. Uniqueness
//! of the live instance is enforced by `ensure_single_instance`, not by a
//! lock: competing instances are killed before launch.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::AutomationError;
use crate::tree::UiTree;

/// Where the target application lives and how to recognize it. The defaults
/// match the supported Video Investigator install; all three are overridable.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub install_dir: PathBuf,
    pub exe_name: String,
    pub window_title: String,
    /// CPU percentage under which the process counts as quiescent.
    pub cpu_threshold: f32,
    /// Maximum time to wait for quiescence before giving up.
    pub quiesce_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from(r"C:\Program Files (x86)\Verint\Video Investigator"),
            exe_name: "Verint.VideoInvestigator.exe".to_string(),
            window_title: "Video Inspector".to_string(),
            cpu_threshold: 5.0,
            quiesce_timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    pub fn exe_path(&self) -> PathBuf {
        self.install_dir.join(&self.exe_name)
    }
}

/// Owns the external process: launch, locate the main window, terminate.
pub trait AppHandle: Send {
    /// Kill any pre-existing instances of the target app. Idempotent.
    fn ensure_single_instance(&mut self) -> Result<(), AutomationError>;

    /// Verify the executable exists, start it from its install directory and
    /// wait for CPU quiescence, then resolve the main window.
    fn launch(&mut self) -> Result<(), AutomationError>;

    /// Dock the main window to the left edge at `width_percent` of the
    /// screen, leaving the rest free for the status surface.
    fn place_window(&mut self, width_percent: u8) -> Result<(), AutomationError>;

    /// Force-terminate the live instance. `TerminationFailed` means the
    /// process survived and needs manual cleanup.
    fn kill(&mut self) -> Result<(), AutomationError>;

    /// The accessibility tree handle. May be obtained before launch;
    /// lookups through it fail until the instance is live.
    fn tree(&self) -> Result<Arc<dyn UiTree>, AutomationError>;
}
