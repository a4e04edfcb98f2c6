//! 单轮事件出口
//!
//! 只追加、保序。写入失败或调用方断开都意味着本轮应当停止，不再发起外部调用。

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::chat::event::OutboundEvent;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("event sink closed")]
pub struct SinkClosed;

#[async_trait]
pub trait EventSink: Send + Sync {
    fn emit(&self, event: OutboundEvent) -> Result<(), SinkClosed>;

    /// 调用方断开时完成；用于在外部调用进行中及时放弃本轮
    async fn closed(&self);
}

/// 基于 mpsc 的出口：接收端被丢弃即视为断开；出口本身被丢弃时接收端随之结束
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: mpsc::UnboundedSender<OutboundEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    fn emit(&self, event: OutboundEvent) -> Result<(), SinkClosed> {
        self.tx.send(event).map_err(|_| SinkClosed)
    }

    async fn closed(&self) {
        self.tx.closed().await
    }
}
