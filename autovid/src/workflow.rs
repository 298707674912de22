//! End-to-end task sequencing.
//!
//! The controller composes its collaborators (site resolver, app handle,
//! navigator, status sink) behind their traits and walks a fixed, linear
//! sequence of steps. There is no partial success: either an image lands on
//! disk and the run ends `Done`, or it ends `Failed` with the first error.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::app::AppHandle;
use crate::errors::AutomationError;
use crate::navigator::Navigate;
use crate::resolver::SiteResolver;
use crate::status::StatusSink;

/// One investigation request. Immutable for the duration of the run.
#[derive(Debug, Clone)]
pub struct Task {
    pub terminal_id: String,
    pub transaction_time: NaiveDateTime,
    pub lookback: chrono::Duration,
    pub output_dir: PathBuf,
    pub width_percent: u8,
    pub file_name: Option<String>,
    pub overwrite: bool,
    /// Free-form investigation reference carried through the logs.
    pub case_id: Option<String>,
}

impl Task {
    pub fn new(
        terminal_id: impl Into<String>,
        transaction_time: NaiveDateTime,
        output_dir: PathBuf,
        width_percent: u8,
    ) -> Result<Self, AutomationError> {
        if !(50..=80).contains(&width_percent) {
            return Err(AutomationError::InvalidArgument(format!(
                "width_percent {width_percent} must be between 50 and 80"
            )));
        }
        Ok(Self {
            terminal_id: terminal_id.into(),
            transaction_time,
            lookback: chrono::Duration::seconds(5),
            output_dir,
            width_percent,
            file_name: None,
            overwrite: true,
            case_id: None,
        })
    }

    pub fn with_lookback(mut self, lookback: chrono::Duration) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_case_id(mut self, case_id: impl Into<String>) -> Self {
        self.case_id = Some(case_id.into());
        self
    }
}

/// Position in the fixed step sequence. Not persisted; recovery is always
/// "reset to baseline and replay".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Idle,
    Resolving,
    Launching,
    LoggingIn,
    ResettingState,
    SelectingSite,
    SelectingCamera,
    SettingTimeRange,
    OpeningRecordedView,
    PlayingVideo,
    ExportingImage,
    SavingImage,
    FinalReset,
    Done,
    Failed,
}

#[derive(Debug)]
pub enum Outcome {
    /// Image saved at the carried path.
    Done(PathBuf),
    Failed(AutomationError),
}

pub struct WorkflowController<'a> {
    task: &'a Task,
    resolver: &'a dyn ResolveSite,
    app: &'a mut dyn AppHandle,
    navigator: &'a dyn Navigate,
    status: &'a dyn StatusSink,
    step: Step,
}

/// Site-resolution boundary as the controller sees it.
pub trait ResolveSite {
    fn resolve(&self, terminal: &str) -> Result<Option<String>, AutomationError>;
}

impl ResolveSite for SiteResolver {
    fn resolve(&self, terminal: &str) -> Result<Option<String>, AutomationError> {
        SiteResolver::resolve(self, terminal)
    }
}

impl<'a> WorkflowController<'a> {
    pub fn new(
        task: &'a Task,
        resolver: &'a dyn ResolveSite,
        app: &'a mut dyn AppHandle,
        navigator: &'a dyn Navigate,
        status: &'a dyn StatusSink,
    ) -> Self {
        Self {
            task,
            resolver,
            app,
            navigator,
            status,
            step: Step::Idle,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Drive the task to a terminal state. Either way the target app is left
    /// at its baseline by a best-effort reset whose own failure is logged,
    /// never re-raised; an image already on disk stays a success. Before
    /// launch there is no instance to reset, so pre-launch failures skip it.
    pub fn run(&mut self) -> Outcome {
        if let Some(case_id) = &self.task.case_id {
            info!(case_id, terminal = %self.task.terminal_id, "starting workflow");
        }
        match self.drive() {
            Ok(saved) => {
                self.step = Step::FinalReset;
                // Cleanup updates are informational; an abort raised here
                // must not demote a saved image.
                let _ = self.status.update("Resetting application state");
                self.best_effort_reset();
                let _ = self.status.update("Finished");
                self.step = Step::Done;
                Outcome::Done(saved)
            }
            Err(err) => {
                if self.step >= Step::Launching {
                    self.best_effort_reset();
                }
                self.step = Step::Failed;
                Outcome::Failed(err)
            }
        }
    }

    fn best_effort_reset(&self) {
        if let Err(err) = self.navigator.reset_state() {
            warn!("cleanup reset failed: {err}");
        }
    }

    fn advance(&mut self, step: Step, message: &str) -> Result<(), AutomationError> {
        self.step = step;
        self.status.update(message)
    }

    fn drive(&mut self) -> Result<PathBuf, AutomationError> {
        let task = self.task;

        self.advance(
            Step::Resolving,
            &format!("Resolving terminal {} to a site", task.terminal_id),
        )?;
        let site = self
            .resolver
            .resolve(&task.terminal_id)?
            .ok_or_else(|| AutomationError::SiteNotFound(task.terminal_id.clone()))?;
        self.status
            .update(&format!("Linked terminal {} to {site}", task.terminal_id))?;

        self.advance(
            Step::Launching,
            "Starting the target application. Please wait...",
        )?;
        self.app.ensure_single_instance()?;
        self.app.launch()?;
        self.app.place_window(task.width_percent)?;

        self.advance(Step::LoggingIn, "Finding and clicking the login button")?;
        self.navigator.login()?;

        self.advance(Step::ResettingState, "Resetting application state")?;
        self.navigator.reset_state()?;

        self.advance(Step::SelectingSite, &format!("Selecting site: {site}"))?;
        self.navigator.select_site(&site)?;

        self.advance(
            Step::SelectingCamera,
            &format!("Finding DVR camera: {}", task.terminal_id),
        )?;
        self.navigator.select_camera(&task.terminal_id)?;

        self.advance(Step::SettingTimeRange, "Entering the date/time range")?;
        self.navigator
            .set_time_range(task.transaction_time, task.lookback)?;

        self.advance(Step::OpeningRecordedView, "Opening recorded video")?;
        self.navigator.click_recorded()?;

        self.advance(Step::PlayingVideo, "Pulling up video. Please wait...")?;
        self.navigator.open_video_view()?;

        self.advance(Step::ExportingImage, "Starting the image export")?;
        self.navigator.open_export_menu()?;

        self.advance(
            Step::SavingImage,
            &format!("Saving the image to {}", task.output_dir.display()),
        )?;
        // Filesystem pre-flights happen before any dialog interaction.
        if !task.output_dir.exists() {
            return Err(AutomationError::OutputDirectoryMissing(
                task.output_dir.clone(),
            ));
        }
        if let Some(name) = &task.file_name {
            let destination = task.output_dir.join(format!("{name}.jpg"));
            if destination.exists() && !task.overwrite {
                return Err(AutomationError::FileExists(destination));
            }
        }
        let saved =
            self.navigator
                .save_image(&task.output_dir, task.file_name.as_deref(), task.overwrite)?;

        Ok(saved)
    }
}
