//! 进度事件 - 编排层
//!
//! 核心只向无界通道写事件，绝不等待消费方；
//! 操作员界面（外部协作方）从另一端读取。

use crate::models::CaseItem;
use serde::Serialize;
use tokio::sync::mpsc;

/// 一条进度事件
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn of(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            key: None,
            name: None,
            error: None,
        }
    }

    pub fn for_item(event: impl Into<String>, item: &CaseItem) -> Self {
        Self {
            event: event.into(),
            key: Some(item.key.clone()),
            name: Some(item.name.clone()),
            error: item.error.clone(),
        }
    }

    pub fn with_error(event: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            key: None,
            name: None,
            error: Some(error.into()),
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<ProgressEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

/// 创建事件通道
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// 发送事件（消费方已退出时静默丢弃）
pub fn emit(sender: &EventSender, event: ProgressEvent) {
    let _ = sender.send(event);
}
