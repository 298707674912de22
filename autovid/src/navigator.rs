//! Lookup-and-act operations against the target application.
//!
//! Every operation follows the same shape: wait for the app to quiesce,
//! re-walk the control path from the main window, act. Lookup failures are
//! transient (the UI may still be rendering) and are retried under a
//! per-operation policy; any other failure escalates immediately.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::errors::AutomationError;
use crate::paths;
use crate::tree::{has_descendant_titled, resolve, resolve_all, resolve_rel, UiNode, UiTree};

/// Ctrl+A then Backspace: text entry always clears stale content first.
const CLEAR_KEYS: &str = "^a{BACKSPACE}";

/// How deep to look for the "Video not found" indicator.
const VIDEO_NOT_FOUND_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

/// Per-operation retry bounds, tuned to how slow each part of the UI is to
/// render. The defaults are the production constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policies {
    pub login: RetryPolicy,
    pub reset: RetryPolicy,
    pub select_site: RetryPolicy,
    pub select_camera: RetryPolicy,
    pub video_view: RetryPolicy,
    pub export: RetryPolicy,
    pub save_image: RetryPolicy,
    /// Unit for the short fixed settle pauses between clicks.
    pub pause_unit: Duration,
}

impl Default for Policies {
    fn default() -> Self {
        Self {
            login: RetryPolicy::new(5, Duration::from_secs(5)),
            reset: RetryPolicy::new(3, Duration::from_secs(5)),
            select_site: RetryPolicy::new(2, Duration::from_secs(2)),
            select_camera: RetryPolicy::new(3, Duration::from_secs(1)),
            video_view: RetryPolicy::new(3, Duration::from_secs(15)),
            export: RetryPolicy::new(3, Duration::from_secs(10)),
            save_image: RetryPolicy::new(3, Duration::from_secs(1)),
            pause_unit: Duration::from_secs(1),
        }
    }
}

/// Retry `op` under `policy`, but only for transient lookup failures.
fn with_retry<T>(
    policy: RetryPolicy,
    name: &str,
    mut op: impl FnMut() -> Result<T, AutomationError>,
) -> Result<T, AutomationError> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.attempts => {
                warn!(
                    "retrying {name} in {:?} (attempt {attempt}/{}) after: {err}",
                    policy.delay, policy.attempts
                );
                thread::sleep(policy.delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// The fixed set of workflow operations the controller sequences.
pub trait Navigate {
    fn login(&self) -> Result<(), AutomationError>;
    fn reset_state(&self) -> Result<(), AutomationError>;
    fn select_site(&self, site: &str) -> Result<(), AutomationError>;
    fn select_camera(&self, camera: &str) -> Result<(), AutomationError>;
    fn set_time_range(
        &self,
        center: NaiveDateTime,
        lookback: chrono::Duration,
    ) -> Result<(), AutomationError>;
    fn click_recorded(&self) -> Result<(), AutomationError>;
    fn open_video_view(&self) -> Result<(), AutomationError>;
    fn open_export_menu(&self) -> Result<(), AutomationError>;
    /// Drive the save-image dialog. Returns the path the image lands at,
    /// `<outdir>/<name>.jpg`, reusing the dialog's auto-generated name when
    /// none is supplied.
    fn save_image(
        &self,
        outdir: &Path,
        name: Option<&str>,
        overwrite: bool,
    ) -> Result<PathBuf, AutomationError>;
}

pub struct Navigator {
    tree: Arc<dyn UiTree>,
    policies: Policies,
}

impl Navigator {
    pub fn new(tree: Arc<dyn UiTree>) -> Self {
        Self::with_policies(tree, Policies::default())
    }

    pub fn with_policies(tree: Arc<dyn UiTree>, policies: Policies) -> Self {
        Self { tree, policies }
    }

    fn pause(&self, units: u32) {
        thread::sleep(self.policies.pause_unit * units);
    }

    /// Phase one of reset: close every open review tab, then collapse the
    /// per-camera workspace nodes via their context menu.
    fn clear_tabs(&self, window: &dyn UiNode) -> Result<(), AutomationError> {
        self.tree.quiesce()?;
        let video_tab = resolve(window, &paths::VIDEO_TAB)?;
        video_tab.click()?;

        for tab in resolve_all(window, &paths::OPEN_VIDEO_TABS)? {
            window.set_focus()?;
            let close = resolve_rel(tab.as_ref(), "tab close button", &[paths::REL_TAB_CLOSE])?;
            close.click()?;
            self.pause(1);
        }

        let workspace_tab = resolve(window, &paths::WORKSPACE_TAB)?;
        workspace_tab.click()?;

        self.tree.quiesce()?;
        for node in resolve_all(window, &paths::OPEN_WORKSPACES)? {
            let menu = resolve_rel(
                node.as_ref(),
                "workspace node menu",
                &[paths::REL_WORKSPACE_MENU],
            )?;
            menu.click()?;
            node.set_focus()?;
            // Fourth context-menu entry collapses the workspace.
            node.send_keys("{DOWN}{DOWN}{DOWN}{DOWN}{ENTER}")?;
            self.pause(1);
        }
        Ok(())
    }

    /// Phase two of reset: empty the dashboard search box and, if the results
    /// menu is open, step through it to its clear action.
    fn clear_dashboard(&self, window: &dyn UiNode) -> Result<(), AutomationError> {
        self.tree.quiesce()?;
        window.set_focus()?;
        resolve(window, &paths::DASHBOARD_TAB)?.click()?;

        let search_box = resolve(window, &paths::SEARCH_BOX)?;
        if search_box.is_visible()? {
            window.set_focus()?;
            search_box.click()?;
            search_box.send_keys(CLEAR_KEYS)?;
        }

        let cards_menu = resolve(window, &paths::CARDS_MENU)?;
        if cards_menu.is_visible()? {
            window.set_focus()?;
            cards_menu.click()?;
            self.pause(1);
            cards_menu.send_keys("{DOWN}{DOWN}{ENTER}")?;
        }
        Ok(())
    }
}

impl Navigate for Navigator {
    fn login(&self) -> Result<(), AutomationError> {
        with_retry(self.policies.login, "login", || {
            self.tree.quiesce()?;
            let window = self.tree.main_window()?;
            window.set_focus()?;
            let button = resolve(window.as_ref(), &paths::LOGIN_BUTTON)?;
            if button.is_visible()? {
                button.click()?;
            }
            Ok(())
        })
    }

    fn reset_state(&self) -> Result<(), AutomationError> {
        // The two phases are retried independently; a stale tab left by a
        // previous run must not cost the dashboard its cleanup attempts.
        with_retry(self.policies.reset, "reset: clear tabs", || {
            let window = self.tree.main_window()?;
            self.clear_tabs(window.as_ref())
        })?;
        with_retry(self.policies.reset, "reset: clear dashboard", || {
            let window = self.tree.main_window()?;
            self.clear_dashboard(window.as_ref())
        })
    }

    fn select_site(&self, site: &str) -> Result<(), AutomationError> {
        with_retry(self.policies.select_site, "select site", || {
            self.tree.quiesce()?;
            let window = self.tree.main_window()?;

            let search_box = resolve(window.as_ref(), &paths::SEARCH_BOX)?;
            search_box.send_keys(&format!("{CLEAR_KEYS}{site}{{ENTER}}"))?;

            let results = resolve_all(window.as_ref(), &paths::SITE_RESULTS)?;
            if results.len() != 1 {
                return Err(AutomationError::ElementNotFound(format!(
                    "site '{site}' returned {} results, expected exactly one",
                    results.len()
                )));
            }

            let expander = resolve_rel(
                results[0].as_ref(),
                "site result expander",
                &[paths::REL_SITE_EXPANDER],
            )?;
            resolve_rel(
                expander.as_ref(),
                "site expand toggle",
                &[paths::REL_SITE_TOGGLE],
            )?
            .toggle()?;
            resolve_rel(
                expander.as_ref(),
                "request video entry",
                paths::REL_REQUEST_VIDEO,
            )?
            .click()?;
            Ok(())
        })
    }

    fn select_camera(&self, camera: &str) -> Result<(), AutomationError> {
        with_retry(self.policies.select_camera, "select camera", || {
            self.tree.quiesce()?;
            let window = self.tree.main_window()?;

            let camera_box = resolve(window.as_ref(), &paths::CAMERA_SEARCH_BOX)?;
            camera_box.send_keys(&format!("{CLEAR_KEYS}{camera}{{ENTER}}"))?;

            self.tree.quiesce()?;
            let result = resolve(window.as_ref(), &paths::CAMERA_FIRST_RESULT)?;
            window.set_focus()?;
            result.click()
        })
    }

    fn set_time_range(
        &self,
        center: NaiveDateTime,
        lookback: chrono::Duration,
    ) -> Result<(), AutomationError> {
        self.tree.quiesce()?;
        let range_text = format!(
            "{} to {}",
            (center - lookback).format("%x %H:%M"),
            (center + lookback).format("%x %H:%M")
        );
        debug!(range = %range_text, "entering time range");

        let window = self.tree.main_window()?;
        let date_box = resolve(window.as_ref(), &paths::DATE_RANGE_BOX)?;
        date_box.set_focus()?;
        date_box.click()?;
        date_box.send_keys(&format!("{CLEAR_KEYS}{range_text}{{SPACE}}{{BACKSPACE}}"))?;

        // A second nudge commits the field; without it the box sometimes
        // keeps the previous range.
        date_box.click()?;
        date_box.set_focus()?;
        date_box.send_keys("{SPACE}{BACKSPACE}")
    }

    fn click_recorded(&self) -> Result<(), AutomationError> {
        self.tree.quiesce()?;
        self.pause(2);
        let window = self.tree.main_window()?;
        let button = resolve(window.as_ref(), &paths::RECORDED_BUTTON)?;
        button.set_focus()?;
        button.click()
    }

    fn open_video_view(&self) -> Result<(), AutomationError> {
        with_retry(self.policies.video_view, "open video view", || {
            self.tree.quiesce()?;
            let window = self.tree.main_window()?;

            if has_descendant_titled(
                window.as_ref(),
                paths::VIDEO_NOT_FOUND_TITLE,
                VIDEO_NOT_FOUND_DEPTH,
            )? {
                return Err(AutomationError::VideoNotFound(
                    "target app reports no footage for the requested range".to_string(),
                ));
            }

            self.tree.quiesce()?;
            let player = resolve(window.as_ref(), &paths::DVR_PLAYER)?;
            player.set_focus()?;
            player.send_keys("{SPACE}")?;

            resolve(window.as_ref(), &paths::SKIP_TO_START_BUTTON)?.click()
        })
    }

    fn open_export_menu(&self) -> Result<(), AutomationError> {
        with_retry(self.policies.export, "open export menu", || {
            self.tree.quiesce()?;
            let window = self.tree.main_window()?;

            let player = resolve(window.as_ref(), &paths::DVR_PLAYER)?;
            let menu = resolve(window.as_ref(), &paths::EXPORT_MENU)?;
            player.set_focus()?;
            menu.click()?;

            self.tree.quiesce()?;
            let popup = self.tree.popup()?;
            resolve_rel(
                popup.as_ref(),
                "export image item",
                &[paths::REL_EXPORT_IMAGE_ITEM],
            )?
            .click()
        })
    }

    fn save_image(
        &self,
        outdir: &Path,
        name: Option<&str>,
        overwrite: bool,
    ) -> Result<PathBuf, AutomationError> {
        if !outdir.exists() {
            return Err(AutomationError::OutputDirectoryMissing(outdir.to_path_buf()));
        }

        with_retry(self.policies.save_image, "save image", || {
            self.tree.quiesce()?;
            let window = self.tree.main_window()?;

            let name_box = resolve(window.as_ref(), &paths::SAVE_IMAGE_NAME_BOX)?;
            let file_name = match name {
                Some(given) => given.to_string(),
                // Reuse the dialog's auto-generated name.
                None => name_box.text()?,
            };

            let destination = outdir.join(format!("{file_name}.jpg"));
            if destination.exists() && !overwrite {
                return Err(AutomationError::FileExists(destination));
            }

            // Tabbing through the dialog is faster than resolving every
            // field, at the cost of depending on its tab order.
            let dialog = resolve(window.as_ref(), &paths::SAVE_IMAGE_DIALOG)?;
            dialog.set_focus()?;
            dialog.send_keys(&format!(
                "{{TAB}}{{TAB}}{CLEAR_KEYS}{file_name}{{TAB}}{{DOWN}}{{DOWN}}\
                 {{TAB}}{CLEAR_KEYS}{}{{TAB}}{{TAB}}{{SPACE}}{{TAB}}{{TAB}}{{TAB}}{{ENTER}}",
                outdir.display()
            ))?;

            // Accept the overwrite confirmation when the target app raises
            // one; its absence is the common case and not an error.
            match self.tree.popup() {
                Ok(popup) => {
                    let yes = resolve_rel(
                        popup.as_ref(),
                        "overwrite confirmation",
                        paths::REL_OVERWRITE_YES,
                    );
                    if let Ok(yes) = yes {
                        if yes.is_visible()? {
                            yes.click()?;
                        }
                    }
                }
                Err(AutomationError::ElementNotFound(_)) => {}
                Err(err) => return Err(err),
            }

            Ok(destination)
        })
    }
}

#[cfg(test)]
mod policy_tests {
    use super::*;

    #[test]
    fn default_policies_match_production_constants() {
        let p = Policies::default();
        assert_eq!(p.login, RetryPolicy::new(5, Duration::from_secs(5)));
        assert_eq!(p.reset, RetryPolicy::new(3, Duration::from_secs(5)));
        assert_eq!(p.select_site, RetryPolicy::new(2, Duration::from_secs(2)));
        assert_eq!(p.select_camera, RetryPolicy::new(3, Duration::from_secs(1)));
        assert_eq!(p.video_view, RetryPolicy::new(3, Duration::from_secs(15)));
        assert_eq!(p.export, RetryPolicy::new(3, Duration::from_secs(10)));
        assert_eq!(p.save_image, RetryPolicy::new(3, Duration::from_secs(1)));
    }

    #[test]
    fn retry_stops_on_non_transient_error() {
        let mut calls = 0;
        let result: Result<(), _> = with_retry(
            RetryPolicy::new(5, Duration::ZERO),
            "op",
            || {
                calls += 1;
                Err(AutomationError::Aborted)
            },
        );
        assert!(matches!(result, Err(AutomationError::Aborted)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn retry_exhausts_transient_errors() {
        let mut calls = 0;
        let result: Result<(), _> = with_retry(
            RetryPolicy::new(4, Duration::ZERO),
            "op",
            || {
                calls += 1;
                Err(AutomationError::ElementNotFound("gone".to_string()))
            },
        );
        assert!(matches!(result, Err(AutomationError::ElementNotFound(_))));
        assert_eq!(calls, 4);
    }
}
