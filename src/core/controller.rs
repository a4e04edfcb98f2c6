//! 单轮对话主循环
//!
//! Query 图谱 -> 判定 -> (终局总结 | 中间通知 + 首个节点) -> 问题节点则带令牌暂停，可执行节点则交给调度器，
//! 再以执行结果为 observation 继续查询。会话状态只通过令牌往返于调用方，服务端不保存。
//! 所有失败都收敛在本轮之内：外层守卫记录日志，并尽力推送一条错误事件。

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::chat::{route, ConversationInput, EventSink, OutboundEvent};
use crate::config::{AppConfig, PlannerSection};
use crate::core::continuation::{self, ContinuationState};
use crate::core::error::TurnError;
use crate::planner::{EkgNode, EkgQuery, HttpPlanner, NodeType, PlannerClient, ToolResponse};
use crate::scheduler::{ExecutionResult, HttpScheduler, NodeExecutor, SchedulerKind, SchedulerManager};

/// 图谱调用失败时展示给用户的统一提示
const PLANNER_FAILURE_TEXT: &str = "图谱执行异常";
const TURN_ABORTED_TEXT: &str = "本轮对话异常中止，请重试";
const QUESTION_PREFIX: &str = "<font color='#A9192d'> *请回答：* </font> \n\n >";

/// 本轮的结束方式（仅用于日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEnd {
    /// 图谱给出终局总结
    Finished,
    /// 等待用户回答问题节点
    AwaitingAnswer,
}

/// 构造查询所需的固定参数
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub default_root_node: String,
    pub scene: String,
    pub intention_rules: Vec<String>,
    pub max_steps: usize,
}

impl From<&PlannerSection> for TurnSettings {
    fn from(cfg: &PlannerSection) -> Self {
        Self {
            default_root_node: cfg.default_root_node.clone(),
            scene: cfg.scene.clone(),
            intention_rules: cfg.intention_rules.clone(),
            max_steps: cfg.max_steps.max(1),
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from(&PlannerSection::default())
    }
}

/// 单轮控制器：无会话状态，可被多个并发的轮次共享
pub struct TurnController {
    planner: Arc<dyn PlannerClient>,
    executor: NodeExecutor,
    settings: TurnSettings,
}

impl TurnController {
    pub fn new(planner: Arc<dyn PlannerClient>, executor: NodeExecutor, settings: TurnSettings) -> Self {
        Self {
            planner,
            executor,
            settings,
        }
    }

    /// 按配置创建：HTTP 图谱客户端 + HTTP 通用调度器
    pub fn from_config(cfg: &AppConfig) -> Self {
        let planner = Arc::new(HttpPlanner::from_config(&cfg.planner));
        let manager = SchedulerManager::new().with(
            SchedulerKind::Common,
            Arc::new(HttpScheduler::from_config(&cfg.executor)),
        );
        let executor = NodeExecutor::new(manager, cfg.executor.tool_keys.clone());
        Self::new(planner, executor, TurnSettings::from(&cfg.planner))
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    /// 驱动一轮对话。结果只通过 sink 中的事件体现；返回时 sink 被丢弃，即本轮结束
    pub async fn run_turn<S: EventSink>(&self, input: ConversationInput, sink: S) {
        let resumed = input.continuation.is_some();
        let outcome = AssertUnwindSafe(self.drive(input, &sink))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(TurnError::Panicked(panic_message(panic.as_ref()))));

        match outcome {
            Ok(end) => tracing::info!(resumed, ?end, "turn finished"),
            Err(TurnError::SinkClosed) => {
                tracing::info!(resumed, "caller disconnected, turn abandoned");
            }
            Err(e) => {
                match &e {
                    TurnError::Planner(_) => tracing::warn!(resumed, error = %e, "{}", PLANNER_FAILURE_TEXT),
                    TurnError::Continuation(_) => tracing::warn!(resumed, error = %e, "rejected continuation"),
                    _ => tracing::error!(resumed, error = %e, "turn aborted"),
                }
                let text = match &e {
                    TurnError::Planner(_) => PLANNER_FAILURE_TEXT.to_string(),
                    TurnError::Continuation(err) => format!("续接信息无效，请重新开始对话（{}）", err),
                    _ => TURN_ABORTED_TEXT.to_string(),
                };
                let _ = sink.emit(OutboundEvent::error(e.event_code(), text));
            }
        }
    }

    async fn drive<S: EventSink>(&self, input: ConversationInput, sink: &S) -> Result<TurnEnd, TurnError> {
        let mut query = self.initial_query(input)?;

        for step in 0..self.settings.max_steps {
            tracing::debug!(session_id = %query.session_id, step, "query planner");
            let verdict = tokio::select! {
                biased;
                _ = sink.closed() => return Err(TurnError::SinkClosed),
                verdict = self.planner.query(&query) => verdict?,
            };

            if let Some(summary) = verdict.summary_text() {
                tracing::info!(session_id = %query.session_id, "游戏结束");
                emit(sink, OutboundEvent::text(summary))?;
                return Ok(TurnEnd::Finished);
            }

            // 中间通知不暂停循环
            if let Some(notice) = verdict.user_interaction_text() {
                tracing::info!(session_id = %query.session_id, notice, "notify user");
                emit(sink, OutboundEvent::role(route(notice)))?;
            }

            let node = verdict.first_node().ok_or(TurnError::EmptyPlan)?;
            match node.node_type {
                NodeType::UserQuestion => {
                    let question = node
                        .question_text()
                        .ok_or_else(|| TurnError::MissingQuestion(node.node_id.clone()))?;
                    let state = ContinuationState::from_node(node, &query.session_id);
                    let token = continuation::encode(&state).map_err(TurnError::Encode)?;
                    let prompt = format!("{}{}", QUESTION_PREFIX, question);
                    tracing::info!(session_id = %query.session_id, node = %node.node_id, "await user answer");
                    emit(
                        sink,
                        OutboundEvent::role(route(&prompt)).with_continuation(token, &query.session_id),
                    )?;
                    return Ok(TurnEnd::AwaitingAnswer);
                }
                NodeType::Executable => {
                    let result = tokio::select! {
                        biased;
                        _ = sink.closed() => return Err(TurnError::SinkClosed),
                        result = self.executor.execute(node) => result?,
                    };
                    query = resume_after_execution(query, node, result);
                }
            }
        }

        Err(TurnError::StepLimit(self.settings.max_steps))
    }

    /// 首次查询：带令牌则续接，否则以默认根节点开启新会话
    pub fn initial_query(&self, input: ConversationInput) -> Result<EkgQuery, TurnError> {
        let mut query = match input.continuation.as_deref() {
            Some(token) => {
                let state = continuation::decode(token)?;
                let answer = ToolResponse::from_user(input.text).to_json();
                let user_answer = match state.node_type {
                    NodeType::UserQuestion => Some(answer.clone()),
                    NodeType::Executable => None,
                };
                EkgQuery {
                    session_id: state.session_id,
                    current_node_id: Some(state.current_node_id),
                    observation: answer,
                    node_type: Some(state.node_type),
                    user_answer,
                    ..Default::default()
                }
            }
            None => {
                let observation = serde_json::json!({ "content": input.text }).to_string();
                EkgQuery {
                    session_id: new_session_id(),
                    observation,
                    start_root_node_id: Some(self.settings.default_root_node.clone()),
                    intention_seed: Some(vec![input.text]),
                    ..Default::default()
                }
            }
        };
        query.intention_rules = Some(self.settings.intention_rules.clone());
        query.scene = self.settings.scene.clone();
        Ok(query)
    }
}

/// 以执行结果作为下一次查询的 observation，并清掉只属于首次查询的字段
fn resume_after_execution(mut query: EkgQuery, node: &EkgNode, result: ExecutionResult) -> EkgQuery {
    query.current_node_id = Some(node.node_id.clone());
    query.node_type = Some(node.node_type);
    query.observation = ToolResponse {
        tool_key: Some(result.tool_key),
        tool_response: result.output,
        tool_param: node.tool_description.clone(),
    }
    .to_json();
    query.user_answer = None;
    query.intention_seed = None;
    query.intention_rules = None;
    query.start_root_node_id = None;
    query
}

fn emit<S: EventSink>(sink: &S, event: OutboundEvent) -> Result<(), TurnError> {
    sink.emit(event).map_err(|_| TurnError::SinkClosed)
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
