//! 图谱规划客户端抽象
//!
//! 所有实现（HTTP / Scripted Mock）实现 PlannerClient：一次 query 对应一次外部调用，失败按三类归档。

use async_trait::async_trait;
use thiserror::Error;

use crate::planner::types::{EkgQuery, EkgVerdict};

/// 图谱调用失败分类；对用户一律展示为同一条失败提示，仅在摘要日志中区分
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// 网络不可达、非 2xx 状态码等
    #[error("Planner transport error: {0}")]
    Transport(String),

    #[error("Planner returned an empty body")]
    EmptyResponse,

    /// 无法解析，或缺少 resultMap / algorithmResult
    #[error("Planner returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl PlannerError {
    /// 摘要日志中的 sysErr 字段
    pub fn digest_code(&self) -> &'static str {
        match self {
            PlannerError::Transport(_) => "ALGO_INVOKE_ERR",
            PlannerError::EmptyResponse => "ALGO_RESP_NULL",
            PlannerError::InvalidResponse(_) => "ALGO_RESP_INVALID",
        }
    }
}

/// 图谱规划客户端 trait
#[async_trait]
pub trait PlannerClient: Send + Sync {
    /// 发起一次查询；任何失败都以 PlannerError 返回，不会 panic
    async fn query(&self, query: &EkgQuery) -> Result<EkgVerdict, PlannerError>;
}
