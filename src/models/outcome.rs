//! 실행 결과 모델

use crate::models::run_state::RunPhase;
use std::path::PathBuf;

/// 대상별 최종 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationOutcome {
    Success,
    PathUnreachable,
    Cancelled,
    CopyFailed,
    VerificationFailed,
    ExtractionFailed,
}

impl DestinationOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            DestinationOutcome::Success => "Success",
            DestinationOutcome::PathUnreachable => "Path unreachable",
            DestinationOutcome::Cancelled => "Cancelled",
            DestinationOutcome::CopyFailed => "Copy failed",
            DestinationOutcome::VerificationFailed => "Verification failed",
            DestinationOutcome::ExtractionFailed => "Extraction failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DestinationOutcome::Success)
    }
}

/// 대상 하나의 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationReport {
    pub label: String,
    pub path: PathBuf,
    pub outcome: DestinationOutcome,
    /// 실패 원인 (성공 시 `None`)
    pub error: Option<String>,
}

impl DestinationReport {
    /// 알림용 한 줄 요약 (`[Primary] update succeeded.`)
    pub fn summary(&self) -> String {
        match (&self.outcome, &self.error) {
            (DestinationOutcome::Success, _) => format!("[{}] update succeeded.", self.label),
            (DestinationOutcome::Cancelled, _) => format!("[{}] cancelled.", self.label),
            (DestinationOutcome::PathUnreachable, _) => {
                format!("[{}] path unreachable.", self.label)
            }
            (outcome, Some(error)) => {
                format!("[{}] {}: {}", self.label, outcome.name().to_lowercase(), error)
            }
            (outcome, None) => format!("[{}] {}.", self.label, outcome.name().to_lowercase()),
        }
    }
}

/// 실행 전체 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// 찾은 원본 아카이브 (찾지 못했으면 `None`)
    pub archive: Option<PathBuf>,
    /// 시도한 대상 결과 (설정 순서). 취소 이후 대상은 포함되지 않는다.
    pub outcomes: Vec<DestinationReport>,
    /// 실행이 중간에 취소되었는지
    pub cancelled: bool,
    /// 최종 단계 (Done / Failed / Cancelled)
    pub final_phase: RunPhase,
    /// 최종 진행률
    pub percent: u8,
}

impl RunReport {
    pub fn source_not_found(&self) -> bool {
        self.archive.is_none()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    #[cfg(test)]
    pub fn outcome_kinds(&self) -> Vec<DestinationOutcome> {
        self.outcomes.iter().map(|r| r.outcome).collect()
    }

    /// 상태 표시줄 문구
    pub fn status_text(&self) -> String {
        if self.source_not_found() {
            return "Archive not found.".to_string();
        }
        if self.cancelled {
            return "Update cancelled.".to_string();
        }
        format!(
            "Done: {}/{} destinations updated.",
            self.success_count(),
            self.outcomes.len()
        )
    }
}

/// 화면의 대상 목록 한 줄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationView {
    pub label: String,
    pub path: PathBuf,
    /// 마지막 확인 결과 (확인 전이면 `None`)
    pub reachable: Option<bool>,
    /// 마지막 실행 결과
    pub last_outcome: Option<DestinationOutcome>,
}

impl DestinationView {
    pub fn new(label: impl Into<String>, path: PathBuf) -> Self {
        Self {
            label: label.into(),
            path,
            reachable: None,
            last_outcome: None,
        }
    }
}
