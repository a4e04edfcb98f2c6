//! 单轮对话错误类型
//!
//! 各层错误（图谱规划、任务调度、续接令牌）汇总到 TurnError，由 TurnController 的外层守卫统一转为事件。

use thiserror::Error;

use crate::core::continuation::TokenError;
use crate::planner::PlannerError;
use crate::scheduler::SchedulerError;

/// 一轮对话中可能中断循环的错误
#[derive(Error, Debug)]
pub enum TurnError {
    /// 续接令牌无法解析（调用方明确要求续接，不能静默地当作新会话）
    #[error("Invalid continuation: {0}")]
    Continuation(#[from] TokenError),

    /// 暂停点无法编码为令牌（如超出长度上限）
    #[error("Cannot encode continuation: {0}")]
    Encode(TokenError),

    #[error("Planner error: {0}")]
    Planner(#[from] PlannerError),

    #[error("Node execution failed: {0}")]
    Execution(#[from] SchedulerError),

    /// 既无 summary 也无可执行节点
    #[error("Planner returned an empty tool plan")]
    EmptyPlan,

    #[error("Question node {0} has no question content")]
    MissingQuestion(String),

    #[error("Step limit reached ({0})")]
    StepLimit(usize),

    /// 调用方已断开，事件无法再写出
    #[error("Event sink closed")]
    SinkClosed,

    #[error("Turn panicked: {0}")]
    Panicked(String),
}

impl TurnError {
    /// 对外事件中的错误码
    pub fn event_code(&self) -> ErrorCode {
        match self {
            TurnError::Continuation(_) => ErrorCode::InvalidContinuation,
            TurnError::Planner(_) => ErrorCode::PlannerFailure,
            _ => ErrorCode::TurnAborted,
        }
    }
}

/// 推送给调用方的错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// 图谱调用失败（网络 / 空响应 / 非法响应，对用户不作区分）
    PlannerFailure,
    InvalidContinuation,
    /// 节点执行等意外失败导致本轮中止
    TurnAborted,
}
