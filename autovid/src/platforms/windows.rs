//! Windows implementation of the accessibility seam, backed by the UI
//! Automation API (`uiautomation` crate) plus `sysinfo` for process control
//! and the CPU-quiescence heuristic.

use std::process::{Child, Command};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::{debug, info, warn};
use uiautomation::patterns;
use uiautomation::types::{TreeScope, UIProperty};
use uiautomation::{UIAutomation, UIElement};

use crate::app::{AppConfig, AppHandle};
use crate::errors::AutomationError;
use crate::tree::{UiNode, UiTree};

/// Inter-keystroke delay for `send_keys`, in milliseconds.
const KEY_INTERVAL_MS: u64 = 10;

/// Poll interval for the CPU-quiescence wait.
const CPU_POLL_INTERVAL: Duration = Duration::from_millis(500);

fn automation() -> Result<UIAutomation, AutomationError> {
    UIAutomation::new().map_err(|e| AutomationError::PlatformError(e.to_string()))
}

fn platform_err(e: uiautomation::Error) -> AutomationError {
    AutomationError::PlatformError(e.to_string())
}

struct WindowsNode {
    element: UIElement,
}

impl UiNode for WindowsNode {
    fn class(&self) -> String {
        self.element.get_classname().unwrap_or_default()
    }

    fn title(&self) -> String {
        self.element.get_name().unwrap_or_default()
    }

    fn children(&self) -> Result<Vec<Box<dyn UiNode>>, AutomationError> {
        let automation = automation()?;
        let condition = automation.create_true_condition().map_err(platform_err)?;
        let children = self
            .element
            .find_all(TreeScope::Children, &condition)
            .map_err(platform_err)?;
        Ok(children
            .into_iter()
            .map(|element| Box::new(WindowsNode { element }) as Box<dyn UiNode>)
            .collect())
    }

    fn click(&self) -> Result<(), AutomationError> {
        self.element.click().map_err(platform_err)
    }

    fn toggle(&self) -> Result<(), AutomationError> {
        self.element
            .get_pattern::<patterns::UITogglePattern>()
            .map_err(platform_err)?
            .toggle()
            .map_err(platform_err)
    }

    fn set_focus(&self) -> Result<(), AutomationError> {
        self.element.set_focus().map_err(platform_err)
    }

    fn send_keys(&self, keys: &str) -> Result<(), AutomationError> {
        self.element
            .send_keys(keys, KEY_INTERVAL_MS)
            .map_err(platform_err)
    }

    fn text(&self) -> Result<String, AutomationError> {
        self.element
            .get_property_value(UIProperty::ValueValue)
            .and_then(|value| value.get_string())
            .map_err(platform_err)
    }

    fn is_visible(&self) -> Result<bool, AutomationError> {
        self.element
            .is_offscreen()
            .map(|offscreen| !offscreen)
            .map_err(platform_err)
    }
}

fn top_level_windows() -> Result<Vec<UIElement>, AutomationError> {
    let automation = automation()?;
    let root = automation.get_root_element().map_err(platform_err)?;
    let condition = automation.create_true_condition().map_err(platform_err)?;
    root.find_all(TreeScope::Children, &condition)
        .map_err(platform_err)
}

fn window_for_pid(pid: u32) -> Result<UIElement, AutomationError> {
    for window in top_level_windows()? {
        if window.get_process_id().map_err(platform_err)? as u32 == pid {
            return Ok(window);
        }
    }
    Err(AutomationError::ElementNotFound(format!(
        "main window of process {pid}"
    )))
}

fn wait_cpu_quiescence(
    pid: u32,
    threshold: f32,
    timeout: Duration,
) -> Result<(), AutomationError> {
    let mut sys = System::new();
    let target = [Pid::from_u32(pid)];
    // First sample only primes the counters.
    sys.refresh_processes(ProcessesToUpdate::Some(&target), true);

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        thread::sleep(CPU_POLL_INTERVAL);
        sys.refresh_processes(ProcessesToUpdate::Some(&target), true);
        match sys.process(Pid::from_u32(pid)) {
            Some(process) if process.cpu_usage() < threshold => return Ok(()),
            Some(process) => {
                debug!(cpu = process.cpu_usage(), "waiting for quiescence");
            }
            None => {
                return Err(AutomationError::PlatformError(format!(
                    "process {pid} exited while waiting for quiescence"
                )))
            }
        }
    }
    Err(AutomationError::LaunchTimeout(timeout))
}

/// Tree view of the launched instance. Holds only the pid (set at launch,
/// cleared on kill), so every window lookup is re-resolved against the live
/// desktop. Handed out before launch; operations fail until the pid is set.
struct WindowsTree {
    pid: Mutex<Option<u32>>,
    cpu_threshold: f32,
    quiesce_timeout: Duration,
}

impl WindowsTree {
    fn live_pid(&self) -> Result<u32, AutomationError> {
        self.pid.lock().unwrap_or_else(|e| e.into_inner()).ok_or_else(|| {
            AutomationError::PlatformError("application has not been launched".to_string())
        })
    }

    fn set_pid(&self, pid: Option<u32>) {
        *self.pid.lock().unwrap_or_else(|e| e.into_inner()) = pid;
    }
}

impl UiTree for WindowsTree {
    fn main_window(&self) -> Result<Box<dyn UiNode>, AutomationError> {
        let element = window_for_pid(self.live_pid()?)?;
        Ok(Box::new(WindowsNode { element }))
    }

    fn popup(&self) -> Result<Box<dyn UiNode>, AutomationError> {
        for window in top_level_windows()? {
            let class = window.get_classname().map_err(platform_err)?;
            let name = window.get_name().map_err(platform_err)?;
            if class == "Popup" && name.is_empty() {
                return Ok(Box::new(WindowsNode { element: window }));
            }
        }
        Err(AutomationError::ElementNotFound(
            "desktop popup window".to_string(),
        ))
    }

    fn quiesce(&self) -> Result<(), AutomationError> {
        wait_cpu_quiescence(self.live_pid()?, self.cpu_threshold, self.quiesce_timeout)
    }
}

/// Owns the Video Investigator process on Windows.
pub struct WindowsApp {
    config: AppConfig,
    child: Option<Child>,
    tree: Arc<WindowsTree>,
}

impl WindowsApp {
    pub fn new(config: AppConfig) -> Self {
        let tree = Arc::new(WindowsTree {
            pid: Mutex::new(None),
            cpu_threshold: config.cpu_threshold,
            quiesce_timeout: config.quiesce_timeout,
        });
        Self {
            config,
            child: None,
            tree,
        }
    }
}

impl AppHandle for WindowsApp {
    fn ensure_single_instance(&mut self) -> Result<(), AutomationError> {
        let mut stale = Vec::new();
        for window in top_level_windows()? {
            if window.get_name().map_err(platform_err)? == self.config.window_title {
                stale.push(window.get_process_id().map_err(platform_err)? as u32);
            }
        }
        if stale.is_empty() {
            return Ok(());
        }

        info!("killing {} pre-existing instance(s)", stale.len());
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::All, true);
        for pid in stale {
            if let Some(process) = sys.process(Pid::from_u32(pid)) {
                if !process.kill() {
                    warn!(pid, "failed to signal pre-existing instance");
                }
            }
        }
        Ok(())
    }

    fn launch(&mut self) -> Result<(), AutomationError> {
        let exe = self.config.exe_path();
        if !exe.exists() {
            return Err(AutomationError::ExecutableNotFound(exe));
        }

        info!(exe = %exe.display(), "launching target application");
        let child = Command::new(&exe)
            .current_dir(&self.config.install_dir)
            .spawn()
            .map_err(|e| AutomationError::PlatformError(format!("failed to spawn: {e}")))?;
        let pid = child.id();
        self.child = Some(child);

        wait_cpu_quiescence(pid, self.config.cpu_threshold, self.config.quiesce_timeout)?;
        // Confirm the main window is actually up before going live.
        window_for_pid(pid)?;

        self.tree.set_pid(Some(pid));
        Ok(())
    }

    fn place_window(&mut self, width_percent: u8) -> Result<(), AutomationError> {
        let automation = automation()?;
        let desktop = automation.get_root_element().map_err(platform_err)?;
        let screen = desktop.get_bounding_rectangle().map_err(platform_err)?;
        let width = f64::from(screen.get_width()) * f64::from(width_percent) / 100.0;

        let window = window_for_pid(self.tree.live_pid()?)?;
        let transform = window
            .get_pattern::<patterns::UITransformPattern>()
            .map_err(platform_err)?;
        transform.move_to(0.0, 0.0).map_err(platform_err)?;
        transform
            .resize(width, f64::from(screen.get_height()))
            .map_err(platform_err)
    }

    fn kill(&mut self) -> Result<(), AutomationError> {
        let mut child = match self.child.take() {
            Some(child) => child,
            None => return Ok(()),
        };
        self.tree.set_pid(None);

        let pid = child.id();
        if let Err(e) = child.kill() {
            return Err(AutomationError::TerminationFailed(format!("pid {pid}: {e}")));
        }
        match child.wait() {
            Ok(status) => {
                debug!(pid, ?status, "target application terminated");
                Ok(())
            }
            Err(e) => Err(AutomationError::TerminationFailed(format!("pid {pid}: {e}"))),
        }
    }

    fn tree(&self) -> Result<Arc<dyn UiTree>, AutomationError> {
        Ok(self.tree.clone())
    }
}
