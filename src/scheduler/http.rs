//! 通过 HTTP 提交任务的调度器
//!
//! POST SubmitTaskRequest（JSON）到 [executor].url，响应为 TaskExeResponse。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::ExecutorSection;
use crate::scheduler::types::{SubmitTaskRequest, TaskExeResponse};
use crate::scheduler::{Scheduler, SchedulerError};

pub struct HttpScheduler {
    client: Client,
    url: String,
}

impl HttpScheduler {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn from_config(cfg: &ExecutorSection) -> Self {
        let mut builder = Client::builder();
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Self {
            client: builder.build().unwrap_or_default(),
            url: cfg.url.clone(),
        }
    }
}

#[async_trait]
impl Scheduler for HttpScheduler {
    async fn submit_task(&self, request: SubmitTaskRequest) -> Result<TaskExeResponse, SchedulerError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SchedulerError::Transport(format!("Request failed: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SchedulerError::TaskFailed(format!("HTTP {}: {}", status, body)));
        }
        resp.json::<TaskExeResponse>()
            .await
            .map_err(|e| SchedulerError::InvalidResponse(e.to_string()))
    }
}
