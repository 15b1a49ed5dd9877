//! 진행 상황 전달
//!
//! 오케스트레이터는 작업 스레드에서 실행되므로 리포터는 `Send + Sync`여야 한다.
//! UI 쪽 구현은 `ChannelReporter`로 이벤트를 채널에 넣고, 메인 루프가 `try_recv`로 꺼낸다.

use crate::models::{Destination, DestinationReport, RunPhase, RunReport};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

pub trait ProgressReporter: Send + Sync {
    fn report(&self, phase: RunPhase, percent: u8, message: &str);

    fn archive_located(&self, _archive: &Path) {}

    fn destination_started(&self, _destination: &Destination) {}

    fn destination_finished(&self, _report: &DestinationReport) {}

    fn run_completed(&self, report: &RunReport);
}

/// 작업 스레드 → UI 이벤트
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    Progress {
        phase: RunPhase,
        percent: u8,
        message: String,
    },
    ArchiveLocated(PathBuf),
    DestinationStarted {
        label: String,
        path: PathBuf,
    },
    DestinationFinished(DestinationReport),
    Completed(RunReport),
}

#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: Sender<UpdateEvent>,
}

impl ChannelReporter {
    pub fn new(tx: Sender<UpdateEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: UpdateEvent) {
        // 수신 측이 없어져도 실행은 계속한다
        if self.tx.send(event).is_err() {
            tracing::debug!("update event receiver dropped");
        }
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, phase: RunPhase, percent: u8, message: &str) {
        self.send(UpdateEvent::Progress {
            phase,
            percent,
            message: message.to_string(),
        });
    }

    fn archive_located(&self, archive: &Path) {
        self.send(UpdateEvent::ArchiveLocated(archive.to_path_buf()));
    }

    fn destination_started(&self, destination: &Destination) {
        self.send(UpdateEvent::DestinationStarted {
            label: destination.label.clone(),
            path: destination.path.clone(),
        });
    }

    fn destination_finished(&self, report: &DestinationReport) {
        self.send(UpdateEvent::DestinationFinished(report.clone()));
    }

    fn run_completed(&self, report: &RunReport) {
        self.send(UpdateEvent::Completed(report.clone()));
    }
}
