//! 图谱规划 HTTP 客户端
//!
//! POST JSON 到配置的图谱地址，固定携带 Content-type / MPS-app-name / MPS-http-version 三个请求头；
//! 响应需含 resultMap.algorithmResult，否则视为非法响应。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::config::PlannerSection;
use crate::planner::digest::DigestGuard;
use crate::planner::types::{EkgQuery, EkgRequest, EkgResponse, EkgVerdict, WireVerdict};
use crate::planner::{PlannerClient, PlannerError};

const HEADER_APP_NAME: &str = "MPS-app-name";
const HEADER_HTTP_VERSION: &str = "MPS-http-version";
const JSON_UTF8: &str = "application/json;charset=utf-8";

/// 图谱 HTTP 客户端：持有 reqwest Client 与地址、调用方标识
pub struct HttpPlanner {
    client: Client,
    url: String,
    app_name: String,
    protocol_version: String,
}

impl HttpPlanner {
    pub fn new(url: impl Into<String>, app_name: impl Into<String>, protocol_version: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url, app_name, protocol_version)
    }

    pub fn with_client(
        client: Client,
        url: impl Into<String>,
        app_name: impl Into<String>,
        protocol_version: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            app_name: app_name.into(),
            protocol_version: protocol_version.into(),
        }
    }

    /// 按 [planner] 配置创建；timeout_secs 未设置时不加客户端超时
    pub fn from_config(cfg: &PlannerSection) -> Self {
        let mut builder = Client::builder();
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Self::with_client(
            builder.build().unwrap_or_default(),
            cfg.url.clone(),
            cfg.app_name.clone(),
            cfg.protocol_version.clone(),
        )
    }

    async fn send(&self, query: &EkgQuery) -> Result<String, PlannerError> {
        let request_json = serde_json::to_string(&EkgRequest::new(query))
            .map_err(|e| PlannerError::Transport(format!("encode request: {}", e)))?;
        tracing::info!(url = %self.url, request = %request_json, "[ekg call]");

        let resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, JSON_UTF8)
            .header(HEADER_APP_NAME, &self.app_name)
            .header(HEADER_HTTP_VERSION, &self.protocol_version)
            .body(request_json)
            .send()
            .await
            .map_err(|e| PlannerError::Transport(format!("Request failed: {}", e)))?;
        if !resp.status().is_success() {
            return Err(PlannerError::Transport(format!("HTTP {}", resp.status())));
        }
        resp.text()
            .await
            .map_err(|e| PlannerError::Transport(format!("Read body: {}", e)))
    }
}

#[async_trait]
impl PlannerClient for HttpPlanner {
    async fn query(&self, query: &EkgQuery) -> Result<EkgVerdict, PlannerError> {
        let mut digest = DigestGuard::start(&query.session_id);

        let body = self.send(query).await.inspect_err(|e| {
            tracing::error!(session_id = %query.session_id, error = %e, "[ekg call error]");
            digest.fail(e);
        })?;
        tracing::info!(session_id = %query.session_id, response = %body, "[ekg call success]");

        let verdict = parse_planner_response(&body).inspect_err(|e| {
            tracing::error!(session_id = %query.session_id, error = %e, "[ekg parse error]");
            digest.fail(e);
        })?;
        digest.succeed();
        Ok(verdict)
    }
}

/// 解析图谱响应体：空 → EmptyResponse；外层或 algorithmResult 缺失 / 无法解析 → InvalidResponse。
/// 有终局总结时不校验 toolPlan；否则只有首个节点需要合法
pub fn parse_planner_response(body: &str) -> Result<EkgVerdict, PlannerError> {
    if body.trim().is_empty() {
        return Err(PlannerError::EmptyResponse);
    }
    let envelope: EkgResponse = serde_json::from_str(body)
        .map_err(|e| PlannerError::InvalidResponse(format!("envelope: {}", e)))?;
    let algorithm_result = envelope
        .result_map
        .ok_or_else(|| PlannerError::InvalidResponse("missing resultMap".to_string()))?
        .algorithm_result
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PlannerError::InvalidResponse("missing algorithmResult".to_string()))?;
    serde_json::from_str::<WireVerdict>(&algorithm_result)
        .and_then(WireVerdict::into_verdict)
        .map_err(|e| PlannerError::InvalidResponse(format!("algorithmResult: {}", e)))
}
