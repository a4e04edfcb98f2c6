//! 图谱规划服务的请求 / 响应结构
//!
//! 线上字段均为 camelCase；请求外层包一层 `{"features":{"query":...}}`，
//! 响应的 `resultMap.algorithmResult` 本身是一段 JSON 字符串，需要二次解析。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 节点类型：可执行工具节点 / 需要用户回答的问题节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "onlyTool")]
    Executable,
    #[serde(rename = "userProblem")]
    UserQuestion,
}

impl NodeType {
    pub fn code(&self) -> &'static str {
        match self {
            NodeType::Executable => "onlyTool",
            NodeType::UserQuestion => "userProblem",
        }
    }
}

/// 一次图谱查询
///
/// 新会话携带 `start_root_node_id` + `intention_seed`；续接时携带 `current_node_id`，二者不会同时出现。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EkgQuery {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_node_id: Option<String>,
    pub observation: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    #[serde(rename = "intentionData", skip_serializing_if = "Option::is_none")]
    pub intention_seed: Option<Vec<String>>,
    #[serde(rename = "intentionRule", skip_serializing_if = "Option::is_none")]
    pub intention_rules: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_root_node_id: Option<String>,
    pub scene: String,
}

/// 请求体外层
#[derive(Debug, Serialize)]
pub struct EkgRequest<'a> {
    pub features: EkgFeatures<'a>,
}

#[derive(Debug, Serialize)]
pub struct EkgFeatures<'a> {
    pub query: &'a EkgQuery,
}

impl<'a> EkgRequest<'a> {
    pub fn new(query: &'a EkgQuery) -> Self {
        Self {
            features: EkgFeatures { query },
        }
    }
}

/// 响应体外层
#[derive(Debug, Deserialize)]
pub struct EkgResponse {
    #[serde(rename = "resultMap")]
    pub result_map: Option<EkgResultMap>,
}

#[derive(Debug, Deserialize)]
pub struct EkgResultMap {
    #[serde(rename = "algorithmResult")]
    pub algorithm_result: Option<String>,
}

/// algorithmResult 的线上形态
///
/// toolPlan 先按原始 JSON 接收：有终局总结时整个计划被忽略，否则只校验首个节点，
/// 后续的预读节点即使类型未知或缺字段也不影响本次判定。
#[derive(Debug, Deserialize)]
pub struct WireVerdict {
    #[serde(default)]
    summary: Option<String>,
    #[serde(rename = "userInteraction", default)]
    user_interaction: Option<String>,
    #[serde(rename = "toolPlan", default)]
    tool_plan: Option<Vec<Value>>,
}

impl WireVerdict {
    pub fn into_verdict(self) -> Result<EkgVerdict, serde_json::Error> {
        let mut verdict = EkgVerdict {
            summary: self.summary,
            user_interaction: self.user_interaction,
            tool_plan: None,
        };
        if verdict.summary_text().is_some() {
            return Ok(verdict);
        }
        verdict.tool_plan = self
            .tool_plan
            .and_then(|plan| plan.into_iter().next())
            .map(|first| serde_json::from_value::<EkgNode>(first).map(|node| vec![node]))
            .transpose()?;
        Ok(verdict)
    }
}

/// 图谱的判定结果（toolPlan 至多保留首个节点）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EkgVerdict {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "userInteraction", skip_serializing_if = "Option::is_none")]
    pub user_interaction: Option<String>,
    #[serde(rename = "toolPlan", skip_serializing_if = "Option::is_none")]
    pub tool_plan: Option<Vec<EkgNode>>,
}

impl EkgVerdict {
    /// 终局总结：非空白时本轮结束
    pub fn summary_text(&self) -> Option<&str> {
        non_blank(self.summary.as_deref())
    }

    /// 需要通知用户的中间信息
    pub fn user_interaction_text(&self) -> Option<&str> {
        non_blank(self.user_interaction.as_deref())
    }

    /// 只消费第一个节点，其余为图谱内部的预读
    pub fn first_node(&self) -> Option<&EkgNode> {
        self.tool_plan.as_ref().and_then(|plan| plan.first())
    }

    pub fn finished(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..Default::default()
        }
    }

    pub fn next(node: EkgNode) -> Self {
        Self {
            tool_plan: Some(vec![node]),
            ..Default::default()
        }
    }

    pub fn with_user_interaction(mut self, text: impl Into<String>) -> Self {
        self.user_interaction = Some(text.into());
        self
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// 图谱返回的一个计划节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EkgNode {
    #[serde(rename = "currentNodeId")]
    pub node_id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(rename = "toolDescription", default, skip_serializing_if = "Option::is_none")]
    pub tool_description: Option<String>,
    #[serde(rename = "memory", default, skip_serializing_if = "Option::is_none")]
    pub memory_hint: Option<Value>,
    #[serde(rename = "questionDescription", default, skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionDescription>,
}

impl EkgNode {
    pub fn executable(node_id: impl Into<String>, tool_description: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            node_type: NodeType::Executable,
            tool_description: Some(tool_description.into()),
            memory_hint: None,
            question: None,
        }
    }

    pub fn question(node_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            node_type: NodeType::UserQuestion,
            tool_description: None,
            memory_hint: None,
            question: Some(QuestionDescription {
                question_type: None,
                question_content: Some(QuestionContent {
                    question: question.into(),
                }),
            }),
        }
    }

    pub fn question_text(&self) -> Option<&str> {
        self.question
            .as_ref()
            .and_then(|q| q.question_content.as_ref())
            .map(|c| c.question.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_content: Option<QuestionContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionContent {
    pub question: String,
}

/// 写入 observation / userAnswer 的工具响应包装
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_key: Option<String>,
    pub tool_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_param: Option<String>,
}

impl ToolResponse {
    pub fn from_user(text: impl Into<String>) -> Self {
        Self {
            tool_response: text.into(),
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> String {
        // 仅含 String / Option<String>，序列化不会失败
        serde_json::to_string(self).unwrap_or_default()
    }
}
