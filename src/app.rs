mod update;

use crate::core::actions::Action;
use crate::core::UpdateEvent;
use crate::models::{DestinationView, RunPhase, RunReport, Settings, UpdateConfig};
use crate::system::{default_connector, DriveProvider, NetworkConnector, SystemDrives};
use crate::ui::{Theme, ThemeMode};
use crate::utils::cancel::CancelToken;
use crate::utils::error::Result;
use crate::utils::logging::UpdateLog;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// 토스트 표시 시간 (초)
const TOAST_SECONDS: u64 = 3;

pub const QUIT_WHILE_UPDATING: &str = "Wait for the update to finish or cancel it.";

/// 진행 중인 업데이트 작업
struct UpdateWorkerState {
    event_rx: Receiver<UpdateEvent>,
    join_handle: Option<JoinHandle<RunReport>>,
    cancel: CancelToken,
}

/// 앱 상태
pub struct App {
    /// 종료 플래그
    pub should_quit: bool,
    /// 설정 파일 경로
    settings_path: PathBuf,
    /// 마지막으로 읽은 설정
    pub settings: Settings,
    /// 검증된 실행 설정 (설정이 잘못되면 이전 값 유지)
    pub config: Option<UpdateConfig>,
    pub theme_mode: ThemeMode,
    pub theme: Theme,
    drives: Arc<dyn DriveProvider>,
    connector: Arc<dyn NetworkConnector>,
    journal: Option<UpdateLog>,
    update_worker: Option<UpdateWorkerState>,
    /// 현재 단계
    pub phase: RunPhase,
    /// 진행률 (0-100)
    pub percent: u8,
    /// 상태 표시줄 문구
    pub status_message: String,
    /// 찾은 아카이브 파일 이름
    pub archive_name: Option<String>,
    /// 처리 중인 대상 (`<label> path: <path>`)
    pub current_target: Option<String>,
    /// 대상 목록 (상태/마지막 결과)
    pub destinations: Vec<DestinationView>,
    /// 마지막 실행 결과
    pub last_report: Option<RunReport>,
    /// 토스트 메시지 (3초 후 자동 소멸)
    pub toast_message: Option<(String, Instant)>,
    /// 표시 대기 중인 토스트
    toast_queue: VecDeque<String>,
}

impl App {
    pub fn new() -> Result<Self> {
        let settings_path = Settings::default_path();
        let journal = UpdateLog::in_dir(&log_dir_for(&settings_path));
        let app = Self::with_parts(
            settings_path,
            Arc::new(SystemDrives),
            Arc::from(default_connector()),
            Some(journal),
        )?;
        Ok(app)
    }

    /// 설정 파일을 읽고 대상 상태를 확인한 앱 생성
    pub(crate) fn with_parts(
        settings_path: PathBuf,
        drives: Arc<dyn DriveProvider>,
        connector: Arc<dyn NetworkConnector>,
        journal: Option<UpdateLog>,
    ) -> Result<Self> {
        let settings = Settings::load_or_create(&settings_path)?;
        let theme_mode = ThemeMode::from_name(&settings.theme);

        let mut app = Self {
            should_quit: false,
            settings_path,
            settings: Settings::default(),
            config: None,
            theme_mode,
            theme: theme_mode.theme(),
            drives,
            connector,
            journal,
            update_worker: None,
            phase: RunPhase::Idle,
            percent: 0,
            status_message: "Ready".to_string(),
            archive_name: None,
            current_target: None,
            destinations: Vec::new(),
            last_report: None,
            toast_message: None,
            toast_queue: VecDeque::new(),
        };
        app.apply_settings(settings);
        app.refresh_destination_status();
        Ok(app)
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(
        settings_path: PathBuf,
        drives: Arc<dyn DriveProvider>,
        connector: Arc<dyn NetworkConnector>,
    ) -> Self {
        match Self::with_parts(settings_path, drives, connector, None) {
            Ok(app) => app,
            Err(e) => panic!("test app: {}", e),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// 설정을 검증해 반영. 잘못된 설정이면 이전 실행 설정을 유지한다.
    fn apply_settings(&mut self, settings: Settings) {
        let parsed = UpdateConfig::from_settings(&settings);
        self.settings = settings;
        match parsed {
            Ok(config) => {
                self.destinations = config
                    .destinations()
                    .into_iter()
                    .map(|d| DestinationView::new(d.label, d.path))
                    .collect();
                self.config = Some(config);
            }
            Err(e) => {
                tracing::warn!(error = %e, "invalid settings ignored");
                self.status_message = "Settings are invalid.".to_string();
                self.set_toast(&e.to_string());
            }
        }
    }

    /// 설정 파일 다시 읽기 + 대상 상태 재확인
    pub fn reload_settings(&mut self) {
        if self.is_updating() {
            self.set_toast("Cannot reload settings while updating.");
            return;
        }
        match Settings::load_or_create(&self.settings_path) {
            Ok(settings) => {
                let valid = settings.validate().is_empty();
                self.theme_mode = ThemeMode::from_name(&settings.theme);
                self.theme = self.theme_mode.theme();
                self.apply_settings(settings);
                self.refresh_destination_status();
                if valid {
                    self.status_message = "Settings reloaded.".to_string();
                    self.set_toast("Settings reloaded.");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "settings reload failed");
                self.set_toast(&e.to_string());
            }
        }
    }

    /// 대상 경로 도달 가능 여부 갱신
    pub fn refresh_destination_status(&mut self) {
        let Some(config) = &self.config else {
            return;
        };
        let statuses = crate::core::check_destinations(config, self.connector.as_ref());
        for status in statuses {
            if let Some(view) = self
                .destinations
                .iter_mut()
                .find(|v| v.label == status.destination.label)
            {
                view.reachable = Some(status.reachable);
            }
        }
    }

    /// 테마 전환 후 설정 파일에 저장
    pub fn toggle_theme(&mut self) {
        self.theme_mode = self.theme_mode.toggled();
        self.theme = self.theme_mode.theme();
        self.settings.theme = self.theme_mode.name().to_string();
        if let Err(e) = self.settings.save(&self.settings_path) {
            tracing::warn!(error = %e, "theme setting not saved");
            self.set_toast(&e.to_string());
        }
    }

    pub fn execute_action(&mut self, action: Action) {
        tracing::debug!(action = action.label(), "action");
        match action {
            Action::StartUpdate => self.start_update(),
            Action::CancelUpdate => self.cancel_update(),
            Action::ReloadSettings => self.reload_settings(),
            Action::ToggleTheme => self.toggle_theme(),
            Action::Quit => self.quit(),
        }
    }

    /// 종료 (업데이트 중이면 거부)
    pub fn quit(&mut self) {
        if self.is_updating() {
            self.set_toast(QUIT_WHILE_UPDATING);
            return;
        }
        self.should_quit = true;
    }

    /// 종료 상태 확인
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// 토스트 추가 (표시 중이면 대기열에 넣는다)
    pub fn set_toast(&mut self, message: &str) {
        if self.toast_message.is_none() {
            self.toast_message = Some((message.to_string(), Instant::now()));
        } else {
            self.toast_queue.push_back(message.to_string());
        }
    }

    /// 만료된 토스트 제거 후 다음 토스트 표시
    pub fn clear_expired_toast(&mut self) {
        if let Some((_, time)) = &self.toast_message {
            if time.elapsed().as_secs() >= TOAST_SECONDS {
                self.toast_message = self
                    .toast_queue
                    .pop_front()
                    .map(|message| (message, Instant::now()));
            }
        }
    }

    /// 토스트 메시지 가져오기 (만료 안 된 경우만)
    pub fn toast_display(&self) -> Option<&str> {
        self.toast_message.as_ref().and_then(|(msg, time)| {
            if time.elapsed().as_secs() < TOAST_SECONDS {
                Some(msg.as_str())
            } else {
                None
            }
        })
    }
}

/// 로그 파일 디렉토리 (설정 파일과 같은 위치)
pub fn log_dir_for(settings_path: &Path) -> PathBuf {
    match settings_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests;
