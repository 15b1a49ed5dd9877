use super::*;
use crate::models::DestinationOutcome;
use crate::system::archive::tests::write_zip;
use crate::system::locator::tests::FakeDrives;
use crate::system::network::NoopConnector;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

struct Workspace {
    _root: TempDir,
    config_path: PathBuf,
    source: PathBuf,
    dest: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let source = root.path().join("source");
        let dest = root.path().join("dest");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&dest).unwrap();
        write_zip(&source.join("update_v7.zip"), &[("app.bin", b"payload")]);
        fs::write(dest.join("stale.txt"), "old").unwrap();

        let config_path = root.path().join("config.toml");
        let settings = Settings {
            network_path: dest.display().to_string(),
            archive_name: "update*.zip".to_string(),
            use_custom_source: true,
            custom_source_path: source.display().to_string(),
            ..Settings::default()
        };
        settings.save(&config_path).unwrap();

        Self {
            _root: root,
            config_path,
            source,
            dest,
        }
    }

    fn app(&self) -> App {
        App::new_for_test(
            self.config_path.clone(),
            Arc::new(FakeDrives(Vec::new())),
            Arc::new(NoopConnector),
        )
    }
}

fn wait_for_update(app: &mut App) {
    for _ in 0..500 {
        app.process_update_events();
        if !app.is_updating() {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("update did not finish in time");
}

#[test]
fn test_new_app_checks_destinations() {
    let ws = Workspace::new();
    let app = ws.app();

    assert!(app.config.is_some());
    assert_eq!(app.destinations.len(), 1);
    assert_eq!(app.destinations[0].label, "Primary");
    assert_eq!(app.destinations[0].reachable, Some(true));
    assert_eq!(app.phase, RunPhase::Idle);
    assert_eq!(app.settings_path(), ws.config_path.as_path());
}

#[test]
fn test_update_runs_to_completion() {
    let ws = Workspace::new();
    let mut app = ws.app();

    app.execute_action(Action::StartUpdate);
    assert!(app.is_updating());
    wait_for_update(&mut app);

    assert_eq!(app.phase, RunPhase::Done);
    assert_eq!(app.percent, 100);
    assert_eq!(app.archive_name.as_deref(), Some("update_v7.zip"));
    assert_eq!(app.status_message, "Done: 1/1 destinations updated.");
    assert_eq!(
        app.destinations[0].last_outcome,
        Some(DestinationOutcome::Success)
    );
    assert!(app.current_target.is_none());
    assert_eq!(fs::read(ws.dest.join("app.bin")).unwrap(), b"payload");
    assert!(!ws.dest.join("stale.txt").exists());
    assert!(ws.source.join("update_v7.zip").exists());
}

#[test]
fn test_second_start_while_running_is_ignored() {
    let ws = Workspace::new();
    let mut app = ws.app();

    app.start_update();
    app.start_update();
    wait_for_update(&mut app);

    let report = app.last_report.as_ref().unwrap();
    assert_eq!(report.outcomes.len(), 1);
}

#[test]
fn test_missing_archive_reports_not_found() {
    let ws = Workspace::new();
    fs::remove_file(ws.source.join("update_v7.zip")).unwrap();
    let mut app = ws.app();

    app.start_update();
    wait_for_update(&mut app);

    assert_eq!(app.phase, RunPhase::Failed);
    assert_eq!(app.status_message, "Archive not found.");
    assert!(ws.dest.join("stale.txt").exists());
}

#[test]
fn test_quit_refused_while_updating() {
    let ws = Workspace::new();
    let mut app = ws.app();

    app.start_update();
    app.execute_action(Action::Quit);
    assert!(!app.should_quit());
    assert_eq!(app.toast_display(), Some(QUIT_WHILE_UPDATING));

    wait_for_update(&mut app);
    app.execute_action(Action::Quit);
    assert!(app.should_quit());
}

#[test]
fn test_cancel_without_running_update_is_noop() {
    let ws = Workspace::new();
    let mut app = ws.app();

    app.execute_action(Action::CancelUpdate);
    assert!(!app.is_updating());
    assert_eq!(app.status_message, "Ready");
}

#[test]
fn test_cancel_sets_status_until_worker_stops() {
    let ws = Workspace::new();
    let mut app = ws.app();

    app.start_update();
    app.cancel_update();
    assert_eq!(app.status_message, "Cancelling...");
    wait_for_update(&mut app);

    // 작업이 먼저 끝났을 수도 있으므로 종료 상태만 확인
    assert!(app.phase.is_terminal());
    assert!(!app.is_updating());
}

#[test]
fn test_completed_event_applies_final_report() {
    let ws = Workspace::new();
    let mut app = ws.app();
    app.current_target = Some(format!("Primary path: {}", ws.dest.display()));

    let report = RunReport {
        archive: Some(ws.source.join("update_v7.zip")),
        outcomes: vec![crate::models::DestinationReport {
            label: "Primary".to_string(),
            path: ws.dest.clone(),
            outcome: DestinationOutcome::Success,
            error: None,
        }],
        cancelled: false,
        final_phase: RunPhase::Done,
        percent: 100,
    };
    app.apply_update_event(UpdateEvent::Completed(report.clone()));

    assert_eq!(app.phase, RunPhase::Done);
    assert_eq!(app.percent, 100);
    assert_eq!(app.status_message, "Done: 1/1 destinations updated.");
    assert_eq!(app.toast_display(), Some("Done: 1/1 destinations updated."));
    assert!(app.current_target.is_none());
    assert_eq!(app.last_report, Some(report));
}

#[test]
fn test_update_reports_completion_once() {
    let ws = Workspace::new();
    let mut app = ws.app();

    app.start_update();
    wait_for_update(&mut app);

    // 완료 토스트는 `Completed` 이벤트와 join 결과 중 한 번만
    let completion = "Done: 1/1 destinations updated.";
    let mut shown = Vec::new();
    while let Some(message) = app.toast_display().map(str::to_string) {
        shown.push(message.clone());
        app.toast_message = Some((
            message,
            Instant::now() - Duration::from_secs(TOAST_SECONDS + 1),
        ));
        app.clear_expired_toast();
    }
    assert_eq!(shown.iter().filter(|m| m.as_str() == completion).count(), 1);
}

#[test]
fn test_reload_with_invalid_settings_keeps_previous_config() {
    let ws = Workspace::new();
    let mut app = ws.app();
    let before = app.config.clone();

    fs::write(
        &ws.config_path,
        "[Settings]\nNetworkPath = \"/srv/x\"\nArchiveName = \"update.zip\"\n",
    )
    .unwrap();
    app.execute_action(Action::ReloadSettings);

    assert_eq!(app.config, before);
    assert_eq!(app.status_message, "Settings are invalid.");
    assert!(app.toast_display().unwrap().contains("ArchiveName"));
}

#[test]
fn test_reload_picks_up_secondary_destination() {
    let ws = Workspace::new();
    let mut app = ws.app();

    let mut settings = Settings::load(&ws.config_path).unwrap();
    settings.use_secondary_path = true;
    settings.secondary_network_path = ws.dest.join("missing").display().to_string();
    settings.save(&ws.config_path).unwrap();
    app.reload_settings();

    assert_eq!(app.destinations.len(), 2);
    assert_eq!(app.destinations[1].label, "Secondary");
    assert_eq!(app.destinations[1].reachable, Some(false));
    assert_eq!(app.status_message, "Settings reloaded.");
}

#[test]
fn test_toggle_theme_persists_setting() {
    let ws = Workspace::new();
    let mut app = ws.app();
    assert_eq!(app.theme_mode, ThemeMode::Dark);

    app.execute_action(Action::ToggleTheme);
    assert_eq!(app.theme_mode, ThemeMode::Light);
    assert_eq!(Settings::load(&ws.config_path).unwrap().theme, "Light");

    // 다른 설정 값은 그대로 유지
    let reopened = ws.app();
    assert_eq!(reopened.theme_mode, ThemeMode::Light);
    assert!(reopened.config.is_some());
}

#[test]
fn test_toast_queue_shows_next_after_expiry() {
    let ws = Workspace::new();
    let mut app = ws.app();

    app.set_toast("first");
    app.set_toast("second");
    assert_eq!(app.toast_display(), Some("first"));

    // 만료 시점으로 되돌림
    app.toast_message = Some((
        "first".to_string(),
        Instant::now() - Duration::from_secs(TOAST_SECONDS + 1),
    ));
    assert_eq!(app.toast_display(), None);
    app.clear_expired_toast();
    assert_eq!(app.toast_display(), Some("second"));
}

#[test]
fn test_log_dir_for_settings_path() {
    assert_eq!(
        log_dir_for(Path::new("/etc/avupdate/config.toml")),
        PathBuf::from("/etc/avupdate")
    );
    assert_eq!(log_dir_for(Path::new("config.toml")), PathBuf::from("."));
}
