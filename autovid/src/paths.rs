//! Accessibility-tree path descriptors for the target application.
//!
//! Every hard-coded traversal of the Video Investigator control tree lives in
//! this table. The paths are an external contract tied to one version of the
//! target app; when a new version moves a control, this file is the only place
//! that changes.

use std::fmt;

/// One child-selection step: filter the children of the current node by
/// control class and/or title, then take the n-th match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    pub class: Option<&'static str>,
    pub title: Option<&'static str>,
    pub index: usize,
}

impl PathStep {
    pub const fn class(name: &'static str) -> Self {
        Self {
            class: Some(name),
            title: None,
            index: 0,
        }
    }

    pub const fn any(index: usize) -> Self {
        Self {
            class: None,
            title: None,
            index,
        }
    }

    pub const fn nth(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub const fn titled(mut self, title: &'static str) -> Self {
        self.title = Some(title);
        self
    }

    pub fn matches(&self, class: &str, title: &str) -> bool {
        if let Some(want) = self.class {
            if class != want {
                return false;
            }
        }
        if let Some(want) = self.title {
            if title != want {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.class, self.title) {
            (Some(c), Some(t)) => write!(f, "{c}['{t}'][{}]", self.index),
            (Some(c), None) => write!(f, "{c}[{}]", self.index),
            (None, Some(t)) => write!(f, "*['{t}'][{}]", self.index),
            (None, None) => write!(f, "*[{}]", self.index),
        }
    }
}

/// A named walk from the main window down to a single control.
#[derive(Debug, Clone, Copy)]
pub struct UiPath {
    pub name: &'static str,
    pub steps: &'static [PathStep],
}

impl UiPath {
    pub const fn new(name: &'static str, steps: &'static [PathStep]) -> Self {
        Self { name, steps }
    }
}

impl fmt::Display for UiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.name)?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{step}")?;
        }
        write!(f, ")")
    }
}

// Top-level tabs. The first TabItem is the dashboard, the second the video
// review workspace.
pub const DASHBOARD_TAB: UiPath = UiPath::new(
    "dashboard tab",
    &[PathStep::class("TabControl"), PathStep::class("TabItem")],
);

pub const VIDEO_TAB: UiPath = UiPath::new(
    "video tab",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
    ],
);

pub const LOGIN_BUTTON: UiPath = UiPath::new(
    "login button",
    &[
        PathStep::class("TabControl"),
        PathStep::any(0),
        PathStep::class("LoginDialog"),
        PathStep::any(0).titled("Login"),
    ],
);

// Dashboard side: site search box and the cards menu used to clear filters.
pub const SEARCH_BOX: UiPath = UiPath::new(
    "dashboard search box",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem"),
        PathStep::class("TextBox"),
    ],
);

pub const CARDS_MENU: UiPath = UiPath::new(
    "dashboard cards menu",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem"),
        PathStep::class("Menu"),
        PathStep::class("MenuItem"),
    ],
);

/// Parent list of site search results; the final step is enumerated, not
/// indexed.
pub const SITE_RESULTS: UiPath = UiPath::new(
    "site search results",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem"),
        PathStep::class("ListView"),
        PathStep::class("ListBoxItem"),
    ],
);

// Video tab side.
pub const VIDEO_REQUEST_PANE: UiPath = UiPath::new(
    "video request pane",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
        PathStep::class("VideoTabControl"),
        PathStep::any(1),
        PathStep::class("VideoRequest"),
    ],
);

pub const CAMERA_SEARCH_BOX: UiPath = UiPath::new(
    "camera search box",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
        PathStep::class("VideoTabControl"),
        PathStep::any(1),
        PathStep::class("VideoRequest"),
        PathStep::class("ScrollViewer"),
        PathStep::class("TextBox"),
    ],
);

pub const CAMERA_FIRST_RESULT: UiPath = UiPath::new(
    "camera first result",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
        PathStep::class("VideoTabControl"),
        PathStep::any(1),
        PathStep::class("VideoRequest"),
        PathStep::class("ScrollViewer"),
        PathStep::class("ListBox"),
        PathStep::class("ListBoxItem"),
    ],
);

pub const DATE_RANGE_BOX: UiPath = UiPath::new(
    "date range box",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
        PathStep::class("VideoTabControl"),
        PathStep::any(1),
        PathStep::class("VideoRequest"),
        PathStep::class("Expander").titled("Recorded Video"),
        PathStep::class("TextBox"),
    ],
);

pub const RECORDED_BUTTON: UiPath = UiPath::new(
    "recorded video button",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
        PathStep::class("VideoTabControl"),
        PathStep::any(1),
        PathStep::class("VideoRequest"),
        PathStep::class("Expander").titled("Recorded Video"),
        PathStep::class("Button").nth(1),
    ],
);

pub const DVR_PLAYER: UiPath = UiPath::new(
    "dvr player",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
        PathStep::any(0),
        PathStep::any(1),
        PathStep::class("DvrVideoPlayer"),
    ],
);

pub const SKIP_TO_START_BUTTON: UiPath = UiPath::new(
    "skip to start button",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
        PathStep::any(0),
        PathStep::any(1),
        PathStep::class("DvrVideoPlayer"),
        PathStep::class("Button").nth(6),
    ],
);

pub const EXPORT_MENU: UiPath = UiPath::new(
    "player export menu",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
        PathStep::any(0),
        PathStep::any(1),
        PathStep::class("DvrVideoPlayer"),
        PathStep::class("VideoContainer"),
        PathStep::class("Menu"),
        PathStep::any(0),
    ],
);

/// Open review tabs inside the video workspace; enumerated.
pub const OPEN_VIDEO_TABS: UiPath = UiPath::new(
    "open video tabs",
    &[
        PathStep::class("TabControl"),
        PathStep::any(1),
        PathStep::any(0),
        PathStep::any(1),
        PathStep::class("VideoTabItem"),
    ],
);

pub const WORKSPACE_TAB: UiPath = UiPath::new(
    "sidebar workspace tab",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
        PathStep::class("VideoTabControl"),
        PathStep::class("Expander"),
        PathStep::class("DvrTree"),
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
    ],
);

/// Expanded per-camera workspace nodes under the sidebar tree; enumerated.
pub const OPEN_WORKSPACES: UiPath = UiPath::new(
    "open workspace nodes",
    &[
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
        PathStep::class("VideoTabControl"),
        PathStep::class("Expander"),
        PathStep::class("DvrTree"),
        PathStep::class("TabControl"),
        PathStep::class("TabItem").nth(1),
        PathStep::class("ScrollViewer"),
        PathStep::class("TreeView"),
        PathStep::class("TreeViewItem").titled("Verint.Database.WrapperClasses.DvrNode"),
    ],
);

pub const SAVE_IMAGE_DIALOG: UiPath = UiPath::new(
    "save image dialog",
    &[PathStep::class("Window").titled("Save Image")],
);

pub const SAVE_IMAGE_NAME_BOX: UiPath = UiPath::new(
    "save image name box",
    &[
        PathStep::class("Window").titled("Save Image"),
        PathStep::class("ExportFrameDialog"),
        PathStep::class("TextBox"),
    ],
);

// Steps relative to a node already in hand (a single site result, an open
// review tab, a workspace node, a desktop popup).
pub const REL_SITE_EXPANDER: PathStep = PathStep::class("Expander");
pub const REL_SITE_TOGGLE: PathStep = PathStep::class("Button");
pub const REL_REQUEST_VIDEO: &[PathStep] =
    &[PathStep::class("ListBox"), PathStep::class("ListBoxItem")];
pub const REL_TAB_CLOSE: PathStep = PathStep::class("Button");
pub const REL_WORKSPACE_MENU: PathStep = PathStep::class("Menu");
pub const REL_EXPORT_IMAGE_ITEM: PathStep = PathStep::class("TextBlock").titled("Export Image");
pub const REL_OVERWRITE_YES: &[PathStep] =
    &[PathStep::any(0), PathStep::class("Button").titled("Yes")];

/// Title of the text control the target app shows when no footage exists for
/// the requested range.
pub const VIDEO_NOT_FOUND_TITLE: &str = "Video not found";
