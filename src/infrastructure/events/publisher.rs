//! Event Publisher Implementation
//!
//! 片段合成进度的广播推送，订阅方（CLI 进度输出、测试）各自接收

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// 广播通道容量
const CHANNEL_CAPACITY: usize = 256;

/// 进度事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ProgressEvent {
    /// 开始合成某个片段
    FragmentStarted {
        run_id: Uuid,
        index: usize,
        total: usize,
    },
    /// 片段合成成功
    FragmentSynthesized {
        run_id: Uuid,
        index: usize,
        total: usize,
        audio_size: usize,
        attempts: u32,
    },
    /// 片段合成失败（不影响其余片段）
    FragmentFailed {
        run_id: Uuid,
        index: usize,
        total: usize,
        error: String,
        attempts: u32,
    },
    /// 整批完成
    BatchCompleted {
        run_id: Uuid,
        succeeded: usize,
        failed: usize,
    },
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<ProgressEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅进度事件
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.channel.subscribe()
    }

    pub fn publish_fragment_started(&self, run_id: Uuid, index: usize, total: usize) {
        self.publish(ProgressEvent::FragmentStarted {
            run_id,
            index,
            total,
        });
    }

    pub fn publish_fragment_synthesized(
        &self,
        run_id: Uuid,
        index: usize,
        total: usize,
        audio_size: usize,
        attempts: u32,
    ) {
        self.publish(ProgressEvent::FragmentSynthesized {
            run_id,
            index,
            total,
            audio_size,
            attempts,
        });
    }

    pub fn publish_fragment_failed(
        &self,
        run_id: Uuid,
        index: usize,
        total: usize,
        error: &str,
        attempts: u32,
    ) {
        self.publish(ProgressEvent::FragmentFailed {
            run_id,
            index,
            total,
            error: error.to_string(),
            attempts,
        });
    }

    pub fn publish_batch_completed(&self, run_id: Uuid, succeeded: usize, failed: usize) {
        self.publish(ProgressEvent::BatchCompleted {
            run_id,
            succeeded,
            failed,
        });
    }

    fn publish(&self, event: ProgressEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
