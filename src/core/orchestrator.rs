//! 업데이트 오케스트레이터
//!
//! 실행 하나의 흐름:
//! `Locating` → 대상마다 `CheckingPath` → `Cleaning` → `Copying` → `Verifying` →
//! `Extracting` → 임시 사본 삭제 → 다음 대상 → `Done`
//!
//! - 대상별 실패는 기록만 하고 다음 대상으로 넘어간다.
//! - 취소는 실행 전체를 멈춘다. 이미 끝난 대상의 결과는 유지된다.
//! - 검증/해제 실패나 취소로 중단되면 대상에 복사한 임시 아카이브를 지운다.

use crate::core::reporter::ProgressReporter;
use crate::models::{
    Destination, DestinationOutcome, DestinationReport, ProgressStage, RunPhase, RunReport,
    RunState, UpdateConfig,
};
use crate::system::archive::{extract_archive, list_entries, verify_archive};
use crate::system::drives::DriveProvider;
use crate::system::filesystem::FileSystem;
use crate::system::locator::ArchiveLocator;
use crate::system::network::{path_reachable, with_connection, NetworkConnector};
use crate::utils::cancel::CancelToken;
use crate::utils::error::{Result, UpdateError};
use crate::utils::formatter::{format_file_size, format_transfer, pluralize};
use crate::utils::logging::UpdateLog;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 대상 경로 상태 (상태 표시용)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationStatus {
    pub destination: Destination,
    pub reachable: bool,
}

/// 활성 대상마다 도달 가능 여부 확인
pub fn check_destinations(
    config: &UpdateConfig,
    connector: &dyn NetworkConnector,
) -> Vec<DestinationStatus> {
    config
        .destinations()
        .into_iter()
        .map(|destination| {
            let reachable = path_reachable(
                connector,
                &destination.path,
                destination.credentials.as_ref(),
            );
            DestinationStatus {
                destination,
                reachable,
            }
        })
        .collect()
}

pub struct UpdateOrchestrator {
    fs: FileSystem,
    drives: Arc<dyn DriveProvider>,
    connector: Arc<dyn NetworkConnector>,
    reporter: Box<dyn ProgressReporter>,
    journal: Option<UpdateLog>,
    state: RunState,
}

impl UpdateOrchestrator {
    pub fn new(
        drives: Arc<dyn DriveProvider>,
        connector: Arc<dyn NetworkConnector>,
        reporter: Box<dyn ProgressReporter>,
    ) -> Self {
        Self {
            fs: FileSystem::new(),
            drives,
            connector,
            reporter,
            journal: None,
            state: RunState::default(),
        }
    }

    /// 작업 기록 파일 지정
    pub fn with_journal(mut self, journal: UpdateLog) -> Self {
        self.journal = Some(journal);
        self
    }

    /// 현재 실행 상태 (읽기 전용)
    #[cfg(test)]
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// 업데이트 1회 실행
    ///
    /// 대상별 에러는 결과에 기록되며 호출자에게 전파되지 않는다.
    pub fn run(&mut self, config: &UpdateConfig, cancel: &CancelToken) -> RunReport {
        let destinations = config.destinations();
        self.state.reset(destinations.len());
        self.record("Update started");
        tracing::info!(mask = %config.mask, destinations = destinations.len(), "update run started");

        self.enter_phase(
            RunPhase::Locating,
            &format!("Looking for {}...", config.mask),
        );
        let locator = ArchiveLocator::new(self.drives.as_ref());
        let archive = match locator.locate(&config.mask, &config.source) {
            Ok(archive) => archive,
            Err(e) => {
                tracing::warn!(error = %e, "archive not found");
                self.record(&format!("Error: {}", e));
                self.enter_phase(RunPhase::Failed, &e.to_string());
                return self.finish(None, Vec::new(), false);
            }
        };

        tracing::info!(archive = %archive.display(), "archive located");
        self.record(&format!("Archive found: {}", archive.display()));
        self.reporter.archive_located(&archive);

        let mut outcomes = Vec::new();
        let mut cancelled = false;
        for (index, destination) in destinations.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            self.state.begin_destination(index);
            self.reporter.destination_started(destination);

            let result = self.process_destination(&archive, destination, cancel);
            let report = self.destination_report(destination, result);
            self.reporter.destination_finished(&report);
            let stop = report.outcome == DestinationOutcome::Cancelled;
            outcomes.push(report);
            if stop {
                cancelled = true;
                break;
            }
        }

        if cancelled {
            self.record("Update cancelled");
            self.enter_phase(RunPhase::Cancelled, "Update cancelled.");
        } else {
            let succeeded = outcomes.iter().filter(|r| r.outcome.is_success()).count();
            self.record(&format!(
                "Update finished: {}/{} destinations updated",
                succeeded,
                outcomes.len()
            ));
            self.enter_phase(RunPhase::Done, "Update finished.");
        }

        self.finish(Some(archive), outcomes, cancelled)
    }

    fn finish(
        &mut self,
        archive: Option<PathBuf>,
        outcomes: Vec<DestinationReport>,
        cancelled: bool,
    ) -> RunReport {
        let report = RunReport {
            archive,
            outcomes,
            cancelled,
            final_phase: self.state.phase,
            percent: self.state.percent,
        };
        tracing::info!(status = %report.status_text(), "update run finished");
        self.reporter.run_completed(&report);
        report
    }

    /// 대상 하나 처리. 접속은 처리가 끝날 때까지 유지된다.
    fn process_destination(
        &mut self,
        archive: &Path,
        destination: &Destination,
        cancel: &CancelToken,
    ) -> Result<()> {
        self.enter_phase(
            RunPhase::CheckingPath,
            &format!("{} path: {}", destination.label, destination.path.display()),
        );
        let connector = Arc::clone(&self.connector);
        with_connection(
            connector.as_ref(),
            &destination.path,
            destination.credentials.as_ref(),
            || self.process_connected(archive, destination, cancel),
        )?
    }

    fn process_connected(
        &mut self,
        archive: &Path,
        destination: &Destination,
        cancel: &CancelToken,
    ) -> Result<()> {
        let dest_dir = destination.path.as_path();
        if !self.fs.directory_exists(dest_dir) {
            return Err(UpdateError::PathUnreachable {
                path: dest_dir.to_path_buf(),
            });
        }
        if archive_inside(archive, dest_dir) {
            return Err(UpdateError::SameSourceAndDest {
                path: dest_dir.to_path_buf(),
            });
        }

        // 정리
        self.enter_phase(
            RunPhase::Cleaning,
            &format!("[{}] Cleaning {}", destination.label, dest_dir.display()),
        );
        self.record(&format!("[{}] Cleaning {}", destination.label, dest_dir.display()));
        let fs = self.fs;
        let cleaned = fs.clean_directory(dest_dir, cancel, |done, total| {
            self.advance(
                RunPhase::Cleaning,
                ProgressStage::Clean,
                fraction(done as u64, total as u64),
                || format!("[{}] Cleaning {}/{}", destination.label, done, total),
            );
        })?;
        tracing::debug!(
            dest = %dest_dir.display(),
            files = cleaned.files_removed,
            dirs = cleaned.dirs_removed,
            "destination cleaned"
        );
        self.advance(RunPhase::Cleaning, ProgressStage::Clean, 1.0, || {
            format!("[{}] Cleaned", destination.label)
        });

        // 복사
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let temp_copy = dest_dir.join(&file_name);
        self.enter_phase(
            RunPhase::Copying,
            &format!("[{}] Copying {}", destination.label, file_name),
        );
        self.record(&format!("[{}] Copying {}", destination.label, file_name));
        fs.copy_file(archive, &temp_copy, cancel, |copied, total| {
            self.advance(
                RunPhase::Copying,
                ProgressStage::Copy,
                fraction(copied, total),
                || {
                    format!(
                        "[{}] Copying {}",
                        destination.label,
                        format_transfer(copied, total)
                    )
                },
            );
        })?;
        self.advance(RunPhase::Copying, ProgressStage::Copy, 1.0, || {
            format!("[{}] Copied {}", destination.label, file_name)
        });

        // 검증 → 해제
        let result = self.verify_and_extract(&temp_copy, destination, cancel);
        if result.is_err() {
            self.discard_temp_copy(&temp_copy, destination);
            return result;
        }

        if let Err(e) = fs.delete_file(&temp_copy) {
            tracing::warn!(error = %e, "temporary archive copy left behind");
            self.record(&format!("[{}] Error: {}", destination.label, e));
        }
        self.advance(RunPhase::Extracting, ProgressStage::Extract, 1.0, || {
            format!("[{}] Update succeeded", destination.label)
        });
        Ok(())
    }

    fn verify_and_extract(
        &mut self,
        temp_copy: &Path,
        destination: &Destination,
        cancel: &CancelToken,
    ) -> Result<()> {
        cancel.check()?;
        self.enter_phase(
            RunPhase::Verifying,
            &format!("[{}] Verifying archive", destination.label),
        );
        if !verify_archive(temp_copy) {
            return Err(UpdateError::VerificationFailed {
                path: temp_copy.to_path_buf(),
            });
        }
        let entries = list_entries(temp_copy)?;
        for entry in &entries {
            tracing::trace!(entry = %entry.path, size = entry.size, "archive entry");
        }
        let unpacked: u64 = entries.iter().filter(|e| !e.is_dir).map(|e| e.size).sum();
        self.record(&format!(
            "[{}] Archive verified: {}, {}",
            destination.label,
            pluralize(entries.len(), "entry", "entries"),
            format_file_size(unpacked)
        ));

        cancel.check()?;
        self.enter_phase(
            RunPhase::Extracting,
            &format!("[{}] Extracting", destination.label),
        );
        self.record(&format!("[{}] Extracting", destination.label));
        let dest_dir = destination.path.as_path();
        let summary = extract_archive(temp_copy, dest_dir, cancel, |done, total| {
            // 구간 끝은 임시 사본 삭제 후에 채운다
            self.advance(
                RunPhase::Extracting,
                ProgressStage::Extract,
                fraction(done as u64, total as u64 + 1),
                || format!("[{}] Extracting {}/{}", destination.label, done, total),
            );
        })?;
        tracing::info!(
            dest = %dest_dir.display(),
            files = summary.files_written,
            "archive extracted"
        );
        self.record(&format!(
            "[{}] Extracted {}",
            destination.label,
            pluralize(summary.files_written, "file", "files")
        ));
        Ok(())
    }

    fn discard_temp_copy(&self, temp_copy: &Path, destination: &Destination) {
        if !temp_copy.exists() {
            return;
        }
        match self.fs.delete_file(temp_copy) {
            Ok(()) => {
                tracing::info!(path = %temp_copy.display(), "temporary archive copy removed");
                self.record(&format!(
                    "[{}] Removed temporary copy {}",
                    destination.label,
                    temp_copy.display()
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not remove temporary archive copy");
                self.record(&format!("[{}] Error: {}", destination.label, e));
            }
        }
    }

    /// 에러 종류와 실패 단계로 대상 결과 결정
    fn destination_report(
        &self,
        destination: &Destination,
        result: Result<()>,
    ) -> DestinationReport {
        let (outcome, error) = match result {
            Ok(()) => (DestinationOutcome::Success, None),
            Err(e) => {
                let outcome = match &e {
                    UpdateError::Cancelled => DestinationOutcome::Cancelled,
                    UpdateError::PathUnreachable { .. } | UpdateError::Connection { .. } => {
                        DestinationOutcome::PathUnreachable
                    }
                    UpdateError::VerificationFailed { .. } => {
                        DestinationOutcome::VerificationFailed
                    }
                    UpdateError::ExtractionFailed { .. } => DestinationOutcome::ExtractionFailed,
                    UpdateError::CopyFailed { .. } | UpdateError::SameSourceAndDest { .. } => {
                        DestinationOutcome::CopyFailed
                    }
                    _ => match self.state.phase {
                        RunPhase::Extracting => DestinationOutcome::ExtractionFailed,
                        RunPhase::Verifying => DestinationOutcome::VerificationFailed,
                        RunPhase::CheckingPath => DestinationOutcome::PathUnreachable,
                        _ => DestinationOutcome::CopyFailed,
                    },
                };
                if e.is_cancelled() {
                    tracing::info!(dest = %destination.path.display(), "destination cancelled");
                } else {
                    tracing::error!(dest = %destination.path.display(), error = %e, "destination failed");
                    self.record(&format!("[{}] Error: {}", destination.label, e));
                }
                (outcome, Some(e.to_string()))
            }
        };

        let report = DestinationReport {
            label: destination.label.clone(),
            path: destination.path.clone(),
            outcome,
            error,
        };
        self.reporter
            .report(self.state.phase, self.state.percent, &report.summary());
        report
    }

    fn enter_phase(&mut self, phase: RunPhase, message: &str) {
        self.state.set_phase(phase);
        tracing::debug!(phase = phase.name(), "{}", message);
        self.reporter.report(phase, self.state.percent, message);
    }

    /// 진행률이 올라갈 때만 보고
    fn advance(
        &mut self,
        phase: RunPhase,
        stage: ProgressStage,
        fraction: f64,
        message: impl FnOnce() -> String,
    ) {
        let before = self.state.percent;
        let after = self.state.advance(stage, fraction);
        if after > before {
            self.reporter.report(phase, after, &message());
        }
    }

    fn record(&self, message: &str) {
        if let Some(journal) = &self.journal {
            journal.append(message);
        }
    }
}

fn fraction(done: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        done as f64 / total as f64
    }
}

/// 원본 아카이브가 대상 디렉토리 안에 있는지 (정리 시 원본이 지워진다)
fn archive_inside(archive: &Path, dest_dir: &Path) -> bool {
    let archive = archive
        .canonicalize()
        .unwrap_or_else(|_| archive.to_path_buf());
    let dest_dir = dest_dir
        .canonicalize()
        .unwrap_or_else(|_| dest_dir.to_path_buf());
    archive.starts_with(dest_dir)
}
