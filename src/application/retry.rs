//! Retry Policy - 合成请求重试策略
//!
//! 由调用方提供（最大尝试次数、固定间隔），核心分片逻辑不感知

use std::future::Future;
use std::time::Duration;

use crate::application::ports::TtsError;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（包含首次），至少为 1
    pub max_attempts: u32,
    /// 两次尝试之间的等待时间
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// 执行操作，可重试错误在间隔后重试，直到尝试次数用尽
    ///
    /// 返回最终结果以及实际尝试次数
    pub async fn run<T, F, Fut>(&self, mut op: F) -> (Result<T, TtsError>, u32)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, TtsError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return (Ok(value), attempt),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        delay_ms = self.delay.as_millis() as u64,
                        "Retryable TTS failure, backing off"
                    );
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => return (Err(err), attempt),
            }
        }
    }
}
