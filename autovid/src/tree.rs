//! Seam between the control logic and the live accessibility tree.
//!
//! `UiNode` handles are ephemeral: the target app rebuilds its control tree
//! between workflow steps, so no handle is ever held across an operation.
//! Every operation re-walks its path from the main window.

use tracing::trace;

use crate::errors::AutomationError;
use crate::paths::{PathStep, UiPath};

/// A live control inside the target application.
pub trait UiNode {
    fn class(&self) -> String;
    fn title(&self) -> String;
    fn children(&self) -> Result<Vec<Box<dyn UiNode>>, AutomationError>;

    fn click(&self) -> Result<(), AutomationError>;
    fn toggle(&self) -> Result<(), AutomationError>;
    fn set_focus(&self) -> Result<(), AutomationError>;
    /// Send a key sequence in `{TAB}{ENTER}`-style notation.
    fn send_keys(&self, keys: &str) -> Result<(), AutomationError>;
    fn text(&self) -> Result<String, AutomationError>;
    fn is_visible(&self) -> Result<bool, AutomationError>;
}

impl std::fmt::Debug for dyn UiNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiNode")
            .field("class", &self.class())
            .field("title", &self.title())
            .finish()
    }
}

/// Access to the target application's window hierarchy.
pub trait UiTree: Send + Sync {
    /// The main application window, re-resolved on every call.
    fn main_window(&self) -> Result<Box<dyn UiNode>, AutomationError>;

    /// A desktop-level `Popup` window (context menus, confirmation prompts
    /// live outside the main window).
    fn popup(&self) -> Result<Box<dyn UiNode>, AutomationError>;

    /// Bounded poll until the target process CPU usage falls under the
    /// quiescence threshold, a proxy for "the UI finished rendering".
    fn quiesce(&self) -> Result<(), AutomationError>;
}

fn select_child(
    parent: &dyn UiNode,
    step: &PathStep,
    context: &str,
) -> Result<Box<dyn UiNode>, AutomationError> {
    let mut seen = 0usize;
    for child in parent.children()? {
        if step.matches(&child.class(), &child.title()) {
            if seen == step.index {
                return Ok(child);
            }
            seen += 1;
        }
    }
    Err(AutomationError::ElementNotFound(format!(
        "{context}: no child matching {step} (found {seen})"
    )))
}

/// Walk a path from `root` down to a single control.
pub fn resolve(root: &dyn UiNode, path: &UiPath) -> Result<Box<dyn UiNode>, AutomationError> {
    trace!(path = %path, "resolving ui path");
    let mut current: Option<Box<dyn UiNode>> = None;
    for step in path.steps {
        let parent: &dyn UiNode = match &current {
            Some(node) => node.as_ref(),
            None => root,
        };
        current = Some(select_child(parent, step, path.name)?);
    }
    current.ok_or_else(|| AutomationError::ElementNotFound(format!("{path}: empty path")))
}

/// Walk a path whose final step enumerates all matches (open tabs, search
/// results). An empty final list is a valid outcome, not a lookup failure.
pub fn resolve_all(
    root: &dyn UiNode,
    path: &UiPath,
) -> Result<Vec<Box<dyn UiNode>>, AutomationError> {
    let (last, prefix) = match path.steps.split_last() {
        Some(split) => split,
        None => return Ok(Vec::new()),
    };

    let mut current: Option<Box<dyn UiNode>> = None;
    for step in prefix {
        let parent: &dyn UiNode = match &current {
            Some(node) => node.as_ref(),
            None => root,
        };
        current = Some(select_child(parent, step, path.name)?);
    }

    let parent: &dyn UiNode = match &current {
        Some(node) => node.as_ref(),
        None => root,
    };
    let mut matches = Vec::new();
    for child in parent.children()? {
        if last.matches(&child.class(), &child.title()) {
            matches.push(child);
        }
    }
    Ok(matches)
}

/// Walk a few steps relative to a node already in hand (a single search
/// result, an open tab, a popup).
pub fn resolve_rel(
    node: &dyn UiNode,
    context: &str,
    steps: &[PathStep],
) -> Result<Box<dyn UiNode>, AutomationError> {
    let mut current: Option<Box<dyn UiNode>> = None;
    for step in steps {
        let parent: &dyn UiNode = match &current {
            Some(n) => n.as_ref(),
            None => node,
        };
        current = Some(select_child(parent, step, context)?);
    }
    current.ok_or_else(|| AutomationError::ElementNotFound(format!("{context}: empty path")))
}

/// Bounded-depth search for a control with the given title. Used for the
/// "Video not found" indicator, which has no stable path.
pub fn has_descendant_titled(
    node: &dyn UiNode,
    title: &str,
    max_depth: usize,
) -> Result<bool, AutomationError> {
    if node.title() == title {
        return Ok(true);
    }
    if max_depth == 0 {
        return Ok(false);
    }
    for child in node.children()? {
        if has_descendant_titled(child.as_ref(), title, max_depth - 1)? {
            return Ok(true);
        }
    }
    Ok(false)
}
