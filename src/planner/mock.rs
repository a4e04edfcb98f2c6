//! 脚本化的图谱客户端（用于测试与本地演示，无需图谱服务）
//!
//! 按顺序返回预先排好的判定结果，并记录收到的每一次查询。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::planner::types::{EkgQuery, EkgVerdict};
use crate::planner::{PlannerClient, PlannerError};

#[derive(Debug, Default)]
pub struct ScriptedPlanner {
    script: Mutex<VecDeque<Result<EkgVerdict, PlannerError>>>,
    received: Mutex<Vec<EkgQuery>>,
}

impl ScriptedPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, verdict: EkgVerdict) -> Self {
        self.push(Ok(verdict));
        self
    }

    pub fn then_err(self, err: PlannerError) -> Self {
        self.push(Err(err));
        self
    }

    fn push(&self, item: Result<EkgVerdict, PlannerError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(item);
        }
    }

    /// 已收到的查询（按调用顺序）
    pub fn queries(&self) -> Vec<EkgQuery> {
        self.received.lock().map(|q| q.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.received.lock().map(|q| q.len()).unwrap_or_default()
    }
}

#[async_trait]
impl PlannerClient for ScriptedPlanner {
    async fn query(&self, query: &EkgQuery) -> Result<EkgVerdict, PlannerError> {
        if let Ok(mut received) = self.received.lock() {
            received.push(query.clone());
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| Err(PlannerError::Transport("script exhausted".to_string())))
    }
}
