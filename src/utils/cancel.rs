//! 실행 단위 취소 신호
//!
//! 실행마다 새로 만들고, UI 스레드에서 `cancel()`, 작업 스레드에서 체크포인트마다
//! `check()`로 관측한다.

use crate::utils::error::{Result, UpdateError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 취소 요청 (여러 번 호출해도 무방)
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// 취소되었으면 `Err(Cancelled)`
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(UpdateError::Cancelled)
        } else {
            Ok(())
        }
    }
}
