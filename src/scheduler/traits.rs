//! 外部任务调度设施抽象

use async_trait::async_trait;
use thiserror::Error;

use crate::scheduler::types::{SchedulerKind, SubmitTaskRequest, TaskExeResponse};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("No scheduler registered for {0}")]
    Unavailable(SchedulerKind),

    #[error("Scheduler transport error: {0}")]
    Transport(String),

    #[error("Scheduler returned an invalid response: {0}")]
    InvalidResponse(String),

    /// 调度器受理了任务但执行失败
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

/// 任务调度器：接收一次提交，同步等待执行结果；重试与超时由调度器自身负责
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn submit_task(&self, request: SubmitTaskRequest) -> Result<TaskExeResponse, SchedulerError>;
}
