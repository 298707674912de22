use chrono::NaiveDate;

use super::fakes::{log_entries, new_log, CollectSink, FakeApp, FakeResolver, RecordingNavigator};
use crate::errors::AutomationError;
use crate::workflow::{Outcome, Step, Task, WorkflowController};

fn sample_time() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 14)
        .unwrap()
        .and_hms_opt(12, 30, 0)
        .unwrap()
}

fn task(outdir: &std::path::Path) -> Task {
    Task::new("CAM-14", sample_time(), outdir.to_path_buf(), 80).unwrap()
}

#[test]
fn width_percent_is_validated_at_construction() {
    let outdir = std::env::temp_dir();
    for bad in [49u8, 81, 100, 0] {
        let err = Task::new("CAM-14", sample_time(), outdir.clone(), bad).unwrap_err();
        assert!(
            matches!(err, AutomationError::InvalidArgument(_)),
            "width {bad} must fail"
        );
    }
    for good in [50u8, 65, 80] {
        assert!(Task::new("CAM-14", sample_time(), outdir.clone(), good).is_ok());
    }
}

#[test]
fn successful_run_saves_exactly_one_image() {
    let outdir = tempfile::tempdir().unwrap();
    let task = task(outdir.path());
    let resolver = FakeResolver::new().with_site("CAM-14", "North Lot");
    let log = new_log();
    let mut app = FakeApp::new(&log);
    let navigator = RecordingNavigator::new(&log);
    let sink = CollectSink::new();

    let mut controller = WorkflowController::new(&task, &resolver, &mut app, &navigator, &sink);
    let outcome = controller.run();

    let saved = match outcome {
        Outcome::Done(path) => path,
        Outcome::Failed(err) => panic!("expected success, got {err}"),
    };
    assert!(saved.exists());
    assert_eq!(controller.step(), Step::Done);

    let files: Vec<_> = std::fs::read_dir(outdir.path()).unwrap().collect();
    assert_eq!(files.len(), 1);

    let entries = log_entries(&log);
    let nav_ops: Vec<_> = entries.iter().filter(|e| e.starts_with("nav:")).collect();
    assert_eq!(
        nav_ops,
        vec![
            "nav:login",
            "nav:reset_state",
            "nav:select_site",
            "nav:select_camera",
            "nav:set_time_range",
            "nav:click_recorded",
            "nav:open_video_view",
            "nav:open_export_menu",
            "nav:save_image",
            "nav:reset_state",
        ]
    );
    assert!(entries.contains(&"app:single".to_string()));
    assert!(entries.contains(&"app:launch".to_string()));
    assert!(entries.contains(&"app:place(80)".to_string()));

    let messages = sink.messages.lock().unwrap();
    assert!(messages.iter().any(|m| m.contains("North Lot")));
}

#[test]
fn final_reset_is_announced_before_finished() {
    let outdir = tempfile::tempdir().unwrap();
    let task = task(outdir.path());
    let resolver = FakeResolver::new().with_site("CAM-14", "North Lot");
    let log = new_log();
    let mut app = FakeApp::new(&log);
    let navigator = RecordingNavigator::new(&log);
    let sink = CollectSink::new();

    let outcome =
        WorkflowController::new(&task, &resolver, &mut app, &navigator, &sink).run();
    assert!(matches!(outcome, Outcome::Done(_)));

    let messages = sink.messages.lock().unwrap();
    assert_eq!(messages.last().map(String::as_str), Some("Finished"));
    // Both the mid-run and the final reset announce themselves; the final
    // one sits right before Finished.
    let last_reset = messages
        .iter()
        .rposition(|m| m == "Resetting application state")
        .unwrap();
    assert_eq!(last_reset, messages.len() - 2);
    let first_reset = messages
        .iter()
        .position(|m| m == "Resetting application state")
        .unwrap();
    assert!(first_reset < last_reset);
}

#[test]
fn unresolvable_terminal_fails_before_launching() {
    let outdir = tempfile::tempdir().unwrap();
    let mut task = task(outdir.path());
    task.terminal_id = "CAM-99".to_string();
    let resolver = FakeResolver::new().with_site("CAM-14", "North Lot");
    let log = new_log();
    let mut app = FakeApp::new(&log);
    let navigator = RecordingNavigator::new(&log);
    let sink = CollectSink::new();

    let outcome =
        WorkflowController::new(&task, &resolver, &mut app, &navigator, &sink).run();

    assert!(matches!(
        outcome,
        Outcome::Failed(AutomationError::SiteNotFound(_))
    ));
    // No launch, and no UI cleanup against an app that never started.
    assert!(log_entries(&log).is_empty());
}

#[test]
fn ambiguous_terminal_fails_with_count() {
    let outdir = tempfile::tempdir().unwrap();
    let task = task(outdir.path());
    let mut resolver = FakeResolver::new();
    resolver.ambiguous = Some(3);
    let log = new_log();
    let mut app = FakeApp::new(&log);
    let navigator = RecordingNavigator::new(&log);
    let sink = CollectSink::new();

    let outcome =
        WorkflowController::new(&task, &resolver, &mut app, &navigator, &sink).run();

    match outcome {
        Outcome::Failed(AutomationError::AmbiguousMatch { count, .. }) => assert_eq!(count, 3),
        other => panic!("expected AmbiguousMatch, got {other:?}"),
    }
}

#[test]
fn launch_timeout_fails_but_still_attempts_cleanup() {
    let outdir = tempfile::tempdir().unwrap();
    let task = task(outdir.path());
    let resolver = FakeResolver::new().with_site("CAM-14", "North Lot");
    let log = new_log();
    let mut app = FakeApp::new(&log).launch_timeout();
    // Cleanup itself failing must not mask the launch error.
    let navigator = RecordingNavigator::new(&log).failing("reset_state", || {
        AutomationError::ElementNotFound("no window".to_string())
    });
    let sink = CollectSink::new();

    let outcome =
        WorkflowController::new(&task, &resolver, &mut app, &navigator, &sink).run();

    assert!(matches!(
        outcome,
        Outcome::Failed(AutomationError::LaunchTimeout(_))
    ));
    let entries = log_entries(&log);
    assert!(entries.contains(&"nav:reset_state".to_string()));
}

#[test]
fn abort_during_status_update_fails_aborted_and_cleans_up() {
    let outdir = tempfile::tempdir().unwrap();
    let task = task(outdir.path());
    let resolver = FakeResolver::new().with_site("CAM-14", "North Lot");
    let log = new_log();
    let mut app = FakeApp::new(&log);
    let navigator = RecordingNavigator::new(&log);
    // Three updates succeed (resolve, link, launch), the fourth aborts.
    let sink = CollectSink::aborting_after(3);

    let outcome =
        WorkflowController::new(&task, &resolver, &mut app, &navigator, &sink).run();

    assert!(matches!(outcome, Outcome::Failed(AutomationError::Aborted)));
    let entries = log_entries(&log);
    assert!(entries.contains(&"nav:reset_state".to_string()));
    // The aborted step's operation never ran.
    assert!(!entries.contains(&"nav:login".to_string()));
}

#[test]
fn missing_output_dir_fails_before_the_save_dialog() {
    let outdir = tempfile::tempdir().unwrap();
    let missing = outdir.path().join("gone");
    let task = Task::new("CAM-14", sample_time(), missing, 80).unwrap();
    let resolver = FakeResolver::new().with_site("CAM-14", "North Lot");
    let log = new_log();
    let mut app = FakeApp::new(&log);
    let navigator = RecordingNavigator::new(&log);
    let sink = CollectSink::new();

    let outcome =
        WorkflowController::new(&task, &resolver, &mut app, &navigator, &sink).run();

    assert!(matches!(
        outcome,
        Outcome::Failed(AutomationError::OutputDirectoryMissing(_))
    ));
    assert!(!log_entries(&log).contains(&"nav:save_image".to_string()));
}

#[test]
fn existing_file_with_overwrite_disabled_fails_before_the_save_dialog() {
    let outdir = tempfile::tempdir().unwrap();
    std::fs::write(outdir.path().join("evidence.jpg"), b"old").unwrap();
    let task = task(outdir.path())
        .with_file_name("evidence")
        .with_overwrite(false);
    let resolver = FakeResolver::new().with_site("CAM-14", "North Lot");
    let log = new_log();
    let mut app = FakeApp::new(&log);
    let navigator = RecordingNavigator::new(&log);
    let sink = CollectSink::new();

    let outcome =
        WorkflowController::new(&task, &resolver, &mut app, &navigator, &sink).run();

    assert!(matches!(
        outcome,
        Outcome::Failed(AutomationError::FileExists(_))
    ));
    assert!(!log_entries(&log).contains(&"nav:save_image".to_string()));
}

#[test]
fn explicit_file_name_lands_with_jpg_suffix() {
    let outdir = tempfile::tempdir().unwrap();
    let task = task(outdir.path()).with_file_name("evidence");
    let resolver = FakeResolver::new().with_site("CAM-14", "North Lot");
    let log = new_log();
    let mut app = FakeApp::new(&log);
    let navigator = RecordingNavigator::new(&log);
    let sink = CollectSink::new();

    let outcome =
        WorkflowController::new(&task, &resolver, &mut app, &navigator, &sink).run();

    match outcome {
        Outcome::Done(path) => {
            assert_eq!(path, outdir.path().join("evidence.jpg"));
            assert!(path.exists());
        }
        Outcome::Failed(err) => panic!("expected success, got {err}"),
    }
}

#[test]
fn mid_sequence_failure_skips_remaining_steps_and_cleans_up() {
    let outdir = tempfile::tempdir().unwrap();
    let task = task(outdir.path());
    let resolver = FakeResolver::new().with_site("CAM-14", "North Lot");
    let log = new_log();
    let mut app = FakeApp::new(&log);
    let navigator = RecordingNavigator::new(&log).failing("open_video_view", || {
        AutomationError::ElementNotFound("dvr player".to_string())
    });
    let sink = CollectSink::new();

    let mut controller = WorkflowController::new(&task, &resolver, &mut app, &navigator, &sink);
    let outcome = controller.run();

    assert!(matches!(
        outcome,
        Outcome::Failed(AutomationError::ElementNotFound(_))
    ));
    assert_eq!(controller.step(), Step::Failed);
    let entries = log_entries(&log);
    assert!(!entries.contains(&"nav:open_export_menu".to_string()));
    assert!(!entries.contains(&"nav:save_image".to_string()));
    // Best-effort reset still ran after the failure.
    assert_eq!(
        entries.iter().filter(|e| *e == "nav:reset_state").count(),
        2
    );
}
