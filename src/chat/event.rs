//! 推送给调用方的事件（可序列化为 JSON，供 SSE / 终端展示）

use std::collections::BTreeMap;

use serde::Serialize;

use crate::chat::content::RoleContent;
use crate::core::error::ErrorCode;

/// extendContext 中存放续接令牌的键
pub const EKG_NODE_KEY: &str = "EKG_NODE";
/// extendContext 中的会话 ID（仅供展示，续接以令牌为准）
pub const CHAT_UNIQUE_ID_KEY: &str = "CHAT_UNIQUE_ID";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventContent {
    /// 纯文本（如终局总结）
    Text { text: String },
    /// 带发言人的消息
    Role(RoleContent),
    Error { code: ErrorCode, text: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundEvent {
    #[serde(flatten)]
    pub content: EventContent,
    #[serde(rename = "extendContext", skip_serializing_if = "BTreeMap::is_empty")]
    pub extend_context: BTreeMap<String, String>,
    /// 毫秒时间戳
    pub timestamp: i64,
}

impl OutboundEvent {
    fn new(content: EventContent) -> Self {
        Self {
            content,
            extend_context: BTreeMap::new(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(EventContent::Text { text: text.into() })
    }

    pub fn role(content: RoleContent) -> Self {
        Self::new(EventContent::Role(content))
    }

    pub fn error(code: ErrorCode, text: impl Into<String>) -> Self {
        Self::new(EventContent::Error {
            code,
            text: text.into(),
        })
    }

    /// 附上续接令牌，调用方需在下一轮原样带回
    pub fn with_continuation(mut self, token: String, session_id: &str) -> Self {
        self.extend_context.insert(EKG_NODE_KEY.to_string(), token);
        self.extend_context
            .insert(CHAT_UNIQUE_ID_KEY.to_string(), session_id.to_string());
        self
    }

    pub fn continuation(&self) -> Option<&str> {
        self.extend_context.get(EKG_NODE_KEY).map(String::as_str)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.content, EventContent::Error { .. })
    }

    /// 展示用的正文
    pub fn body(&self) -> &str {
        match &self.content {
            EventContent::Text { text } => text,
            EventContent::Role(role) => &role.text,
            EventContent::Error { text, .. } => text,
        }
    }
}
