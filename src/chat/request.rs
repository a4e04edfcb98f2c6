//! 调用方请求与单轮输入

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::chat::event::EKG_NODE_KEY;

/// 线上请求：`{"content":{"text":"..."},"extendContext":{"EKG_NODE":"<token>"}}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub content: TextContent,
    #[serde(rename = "extendContext", default)]
    pub extend_context: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub text: String,
}

/// 单轮输入：用户文本 + 可选的续接令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationInput {
    pub text: String,
    pub continuation: Option<String>,
}

impl ConversationInput {
    pub fn fresh(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            continuation: None,
        }
    }

    pub fn resume(text: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            continuation: Some(token.into()),
        }
    }
}

impl From<ChatRequest> for ConversationInput {
    fn from(req: ChatRequest) -> Self {
        // 只要带了 EKG_NODE 就视为续接；非字符串值原样交给解码器报错，而不是退化为新会话
        let continuation = req.extend_context.get(EKG_NODE_KEY).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        Self {
            text: req.content.text,
            continuation,
        }
    }
}
