//! 실행 상태 모델
//!
//! 오케스트레이터가 단독으로 소유/변경하고, 리포터에는 읽기 전용 스냅샷만 전달한다.

/// 실행 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Locating,
    CheckingPath,
    Cleaning,
    Copying,
    Verifying,
    Extracting,
    Done,
    Failed,
    Cancelled,
}

impl RunPhase {
    /// 단계 이름 반환
    pub fn name(&self) -> &'static str {
        match self {
            RunPhase::Idle => "Idle",
            RunPhase::Locating => "Locating",
            RunPhase::CheckingPath => "Checking path",
            RunPhase::Cleaning => "Cleaning",
            RunPhase::Copying => "Copying",
            RunPhase::Verifying => "Verifying",
            RunPhase::Extracting => "Extracting",
            RunPhase::Done => "Done",
            RunPhase::Failed => "Failed",
            RunPhase::Cancelled => "Cancelled",
        }
    }

    /// 종료 상태 여부
    #[cfg(test)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Failed | RunPhase::Cancelled)
    }
}

/// 대상 하나 안에서의 진행 구간
///
/// 정리 → 1/3, 복사(+검증) → 2/3, 압축 해제 → 3/3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Clean,
    Copy,
    Extract,
}

impl ProgressStage {
    fn index(self) -> usize {
        match self {
            ProgressStage::Clean => 0,
            ProgressStage::Copy => 1,
            ProgressStage::Extract => 2,
        }
    }
}

const STAGES_PER_DESTINATION: usize = 3;

/// 실행 상태
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    /// 현재 단계
    pub phase: RunPhase,
    /// 처리 중인 대상 인덱스
    pub destination_index: usize,
    /// 활성 대상 수
    pub destination_count: usize,
    /// 전체 진행률 (0-100)
    pub percent: u8,
    /// 취소 관측 여부
    pub cancelled: bool,
}

impl RunState {
    /// 새 실행 시작 (이전 실행 상태 초기화)
    pub fn reset(&mut self, destination_count: usize) {
        *self = Self {
            destination_count,
            ..Self::default()
        };
    }

    pub fn set_phase(&mut self, phase: RunPhase) {
        self.phase = phase;
        if phase == RunPhase::Cancelled {
            self.cancelled = true;
        }
    }

    pub fn begin_destination(&mut self, index: usize) {
        self.destination_index = index;
    }

    /// 현재 대상의 `stage` 구간 중 `fraction`(0.0-1.0)만큼 진행
    ///
    /// 진행률은 감소하지 않으며, 마지막 대상의 마지막 구간이 끝났을 때만 100이 된다.
    pub fn advance(&mut self, stage: ProgressStage, fraction: f64) -> u8 {
        let percent = stage_percent(
            self.destination_index,
            self.destination_count,
            stage,
            fraction,
        );
        self.percent = self.percent.max(percent);
        self.percent
    }
}

/// 전체 진행률 계산 (내림)
pub fn stage_percent(
    destination_index: usize,
    destination_count: usize,
    stage: ProgressStage,
    fraction: f64,
) -> u8 {
    if destination_count == 0 {
        return 0;
    }
    let fraction = fraction.clamp(0.0, 1.0);
    let total_units = (destination_count * STAGES_PER_DESTINATION) as f64;
    let done_units =
        (destination_index * STAGES_PER_DESTINATION + stage.index()) as f64 + fraction;
    let percent = (done_units / total_units * 100.0).floor();
    percent.clamp(0.0, 100.0) as u8
}
