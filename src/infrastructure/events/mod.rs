//! Events - 进度事件推送

mod publisher;

pub use publisher::{EventPublisher, ProgressEvent};
