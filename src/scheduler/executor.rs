//! 节点执行器
//!
//! 把一个可执行节点翻译为任务提交（工具描述作意图、记忆提示、配置的工具 key），交给通用调度器执行，
//! 并把返回整理为 ExecutionResult；每次提交输出一条结构化审计日志（JSON）。本身不做重试与超时。

use std::collections::BTreeSet;
use std::time::Instant;

use crate::planner::EkgNode;
use crate::scheduler::types::{ExecutionResult, SchedulerKind, SubmitTaskRequest};
use crate::scheduler::{SchedulerError, SchedulerManager};

pub struct NodeExecutor {
    manager: SchedulerManager,
    tool_keys: BTreeSet<String>,
}

impl NodeExecutor {
    pub fn new(manager: SchedulerManager, tool_keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            manager,
            tool_keys: tool_keys.into_iter().collect(),
        }
    }

    pub fn build_request(&self, node: &EkgNode) -> SubmitTaskRequest {
        SubmitTaskRequest {
            intention: node.tool_description.clone().unwrap_or_default(),
            memory: node.memory_hint.clone(),
            tools: self.tool_keys.clone(),
        }
    }

    pub async fn execute(&self, node: &EkgNode) -> Result<ExecutionResult, SchedulerError> {
        let scheduler = self.manager.get_scheduler(SchedulerKind::Common)?;
        let request = self.build_request(node);

        let start = Instant::now();
        let result = scheduler.submit_task(request).await;
        let audit = serde_json::json!({
            "event": "node_audit",
            "node": node.node_id,
            "scheduler": SchedulerKind::Common.as_str(),
            "ok": result.is_ok(),
            "tool_key": result.as_ref().map(|r| r.tool_key.as_str()).unwrap_or("-"),
            "duration_ms": start.elapsed().as_millis() as u64,
        });
        tracing::info!(audit = %audit, "node");

        result.map(ExecutionResult::from)
    }
}
