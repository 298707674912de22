//! Automated still-frame retrieval from the Verint Video Investigator review
//! application.
//!
//! Given a terminal identifier and a transaction timestamp, the workflow
//! resolves the terminal to a site, drives the target app's accessibility
//! tree to the matching camera and time window, exports a frame and saves it
//! to disk. The control layer is platform-neutral behind the [`tree::UiTree`]
//! seam; the Windows backend lives in [`platforms`].

pub mod app;
pub mod errors;
pub mod navigator;
pub mod paths;
pub mod platforms;
pub mod resolver;
pub mod status;
pub mod tree;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use app::{AppConfig, AppHandle};
pub use errors::AutomationError;
pub use navigator::{Navigate, Navigator, Policies, RetryPolicy};
pub use resolver::SiteResolver;
pub use status::{AbortFlag, ChannelSink, LogSink, StatusSink};
pub use workflow::{Outcome, ResolveSite, Step, Task, WorkflowController};
