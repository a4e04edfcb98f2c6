//! 任务调度的提交 / 返回结构

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 调度器类别；本服务只使用通用调度器
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SchedulerKind {
    Common,
}

impl SchedulerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerKind::Common => "general-purpose",
        }
    }
}

impl std::fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 提交给调度器的任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitTaskRequest {
    /// 节点的工具描述，作为本次任务的意图
    pub intention: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Value>,
    /// 允许调度器选用的工具 key
    pub tools: BTreeSet<String>,
}

/// 调度器返回
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskExeResponse {
    pub tool_key: String,
    #[serde(default)]
    pub response: String,
}

/// 单个节点的执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub tool_key: String,
    pub output: String,
}

impl From<TaskExeResponse> for ExecutionResult {
    fn from(r: TaskExeResponse) -> Self {
        Self {
            tool_key: r.tool_key,
            output: r.response,
        }
    }
}
