//! 续接令牌编解码
//!
//! 服务端不保存会话：本轮因问题节点暂停时，把 (节点, 会话 ID) 编码为不透明令牌交给调用方，
//! 下一轮由调用方原样带回。令牌格式：`v1.` + URL 安全 base64（无填充）的 JSON，长度上限 8 KiB。

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::planner::{EkgNode, NodeType};

const TOKEN_VERSION: &str = "v1";

/// 令牌最大长度（字节）
pub const MAX_TOKEN_LEN: usize = 8 * 1024;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("Empty continuation token")]
    Empty,

    #[error("Unsupported continuation version: {0}")]
    UnsupportedVersion(String),

    #[error("Continuation token too large: {0} bytes")]
    TooLarge(usize),

    /// base64 或 JSON 无法解析（截断 / 篡改）
    #[error("Malformed continuation token: {0}")]
    Malformed(String),
}

/// 暂停点状态：令牌只对紧接着的下一轮有效，消费后即丢弃
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationState {
    pub current_node_id: String,
    pub session_id: String,
    pub node_type: NodeType,
}

impl ContinuationState {
    pub fn new(current_node_id: impl Into<String>, session_id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            current_node_id: current_node_id.into(),
            session_id: session_id.into(),
            node_type,
        }
    }

    /// 由暂停的节点构造。只记录定位信息，令牌长度与问题内容无关
    pub fn from_node(node: &EkgNode, session_id: &str) -> Self {
        Self::new(node.node_id.clone(), session_id, node.node_type)
    }
}

/// 编码为令牌；超出长度上限时返回 TooLarge
pub fn encode(state: &ContinuationState) -> Result<String, TokenError> {
    let json = serde_json::to_vec(state).map_err(|e| TokenError::Malformed(e.to_string()))?;
    let token = format!("{}.{}", TOKEN_VERSION, URL_SAFE_NO_PAD.encode(json));
    if token.len() > MAX_TOKEN_LEN {
        return Err(TokenError::TooLarge(token.len()));
    }
    Ok(token)
}

pub fn decode(token: &str) -> Result<ContinuationState, TokenError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Empty);
    }
    if token.len() > MAX_TOKEN_LEN {
        return Err(TokenError::TooLarge(token.len()));
    }
    let (version, payload) = token
        .split_once('.')
        .ok_or_else(|| TokenError::Malformed("missing version prefix".to_string()))?;
    if version != TOKEN_VERSION {
        return Err(TokenError::UnsupportedVersion(version.to_string()));
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| TokenError::Malformed(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Malformed(e.to_string()))
}
