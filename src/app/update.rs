use super::{App, UpdateWorkerState};
use crate::core::{ChannelReporter, UpdateEvent, UpdateOrchestrator};
use crate::models::{RunPhase, RunReport};
use crate::utils::cancel::CancelToken;
use std::sync::mpsc;
use std::sync::Arc;

impl App {
    /// 업데이트 작업 실행 중 여부
    pub fn is_updating(&self) -> bool {
        self.update_worker.is_some()
    }

    /// 작업 스레드에서 업데이트 시작
    pub fn start_update(&mut self) {
        if self.is_updating() {
            return;
        }
        let Some(config) = self.config.clone() else {
            self.set_toast("Settings are invalid. Fix the configuration file and reload.");
            return;
        };

        let (event_tx, event_rx) = mpsc::channel::<UpdateEvent>();
        let cancel = CancelToken::new();
        let cancel_for_worker = cancel.clone();
        let mut orchestrator = UpdateOrchestrator::new(
            Arc::clone(&self.drives),
            Arc::clone(&self.connector),
            Box::new(ChannelReporter::new(event_tx)),
        );
        if let Some(journal) = &self.journal {
            orchestrator = orchestrator.with_journal(journal.clone());
        }
        let handle =
            std::thread::spawn(move || orchestrator.run(&config, &cancel_for_worker));

        self.update_worker = Some(UpdateWorkerState {
            event_rx,
            join_handle: Some(handle),
            cancel,
        });
        self.phase = RunPhase::Locating;
        self.percent = 0;
        self.archive_name = None;
        self.current_target = None;
        self.last_report = None;
        for view in &mut self.destinations {
            view.last_outcome = None;
        }
        self.status_message = "Updating...".to_string();
    }

    /// 취소 요청 (현재 단계의 다음 체크포인트에서 멈춘다)
    pub fn cancel_update(&mut self) {
        let Some(worker) = &self.update_worker else {
            return;
        };
        if !worker.cancel.is_cancelled() {
            worker.cancel.cancel();
            self.status_message = "Cancelling...".to_string();
        }
    }

    /// 작업 진행 상태 반영 (메인 루프에서 호출)
    pub fn process_update_events(&mut self) {
        self.drain_update_events();

        let is_finished = self
            .update_worker
            .as_ref()
            .and_then(|worker| worker.join_handle.as_ref())
            .is_some_and(std::thread::JoinHandle::is_finished);
        if !is_finished {
            return;
        }

        // 종료 직전에 보낸 이벤트까지 반영
        self.drain_update_events();
        let Some(mut worker) = self.update_worker.take() else {
            return;
        };
        let Some(handle) = worker.join_handle.take() else {
            return;
        };
        match handle.join() {
            // 보통은 `Completed` 이벤트로 이미 반영되어 있다
            Ok(report) => {
                if self.last_report.is_none() {
                    self.finish_update(report);
                }
            }
            Err(_) => {
                tracing::error!("update worker thread panicked");
                self.phase = RunPhase::Failed;
                self.status_message = "Update failed unexpectedly.".to_string();
                self.set_toast("Update failed unexpectedly.");
            }
        }
    }

    fn drain_update_events(&mut self) {
        let Some(worker) = &self.update_worker else {
            return;
        };
        let events: Vec<UpdateEvent> = worker.event_rx.try_iter().collect();
        for event in events {
            self.apply_update_event(event);
        }
    }

    pub(super) fn apply_update_event(&mut self, event: UpdateEvent) {
        match event {
            UpdateEvent::Progress {
                phase,
                percent,
                message,
            } => {
                self.phase = phase;
                self.percent = self.percent.max(percent);
                self.status_message = message;
            }
            UpdateEvent::ArchiveLocated(path) => {
                self.archive_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string());
            }
            UpdateEvent::DestinationStarted { label, path } => {
                self.current_target = Some(format!("{} path: {}", label, path.display()));
            }
            UpdateEvent::DestinationFinished(report) => {
                if let Some(view) = self
                    .destinations
                    .iter_mut()
                    .find(|view| view.label == report.label)
                {
                    view.last_outcome = Some(report.outcome);
                }
                self.set_toast(&report.summary());
            }
            UpdateEvent::Completed(report) => self.finish_update(report),
        }
    }

    fn finish_update(&mut self, report: RunReport) {
        self.phase = report.final_phase;
        self.percent = report.percent;
        self.status_message = report.status_text();
        self.set_toast(&report.status_text());
        self.current_target = None;
        self.last_report = Some(report);
        self.refresh_destination_status();
    }
}
