//! 单轮对话集成测试：脚本化图谱 + 本地调度器，验证主循环的各条出口

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ekg_chat::chat::{ChannelSink, ConversationInput, EventContent, OutboundEvent, Speaker};
use ekg_chat::core::continuation::{self, ContinuationState};
use ekg_chat::core::{ErrorCode, TurnController, TurnSettings};
use ekg_chat::planner::{EkgNode, EkgQuery, EkgVerdict, NodeType, PlannerClient, PlannerError, ScriptedPlanner};
use ekg_chat::scheduler::{
    NodeExecutor, Scheduler, SchedulerError, SchedulerKind, SchedulerManager, SubmitTaskRequest, TaskExeResponse,
};
use tokio::sync::Notify;

/// 记录每次提交，并按 tool_key 回显意图
#[derive(Default)]
struct RecordingScheduler {
    seen: Mutex<Vec<SubmitTaskRequest>>,
    fail: bool,
}

impl RecordingScheduler {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Scheduler for RecordingScheduler {
    async fn submit_task(&self, request: SubmitTaskRequest) -> Result<TaskExeResponse, SchedulerError> {
        let intention = request.intention.clone();
        self.seen.lock().unwrap().push(request);
        if self.fail {
            return Err(SchedulerError::TaskFailed("tool crashed".to_string()));
        }
        Ok(TaskExeResponse {
            tool_key: "speak".to_string(),
            response: format!("done: {}", intention),
        })
    }
}

/// 通知已开始后永不返回，用于模拟执行中调用方断开
#[derive(Default)]
struct HangingScheduler {
    started: Notify,
}

#[async_trait]
impl Scheduler for HangingScheduler {
    async fn submit_task(&self, _request: SubmitTaskRequest) -> Result<TaskExeResponse, SchedulerError> {
        self.started.notify_one();
        std::future::pending().await
    }
}

fn controller_with(
    planner: Arc<ScriptedPlanner>,
    scheduler: Arc<dyn Scheduler>,
    settings: TurnSettings,
) -> TurnController {
    let manager = SchedulerManager::new().with(SchedulerKind::Common, scheduler);
    TurnController::new(planner, NodeExecutor::new(manager, vec!["speak".to_string()]), settings)
}

/// 跑完一轮并收集全部事件（sink 被丢弃后接收端结束）
async fn run(controller: &TurnController, input: ConversationInput) -> Vec<OutboundEvent> {
    let (sink, mut rx) = ChannelSink::new();
    controller.run_turn(input, sink).await;
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn error_code(event: &OutboundEvent) -> Option<ErrorCode> {
    match &event.content {
        EventContent::Error { code, .. } => Some(*code),
        _ => None,
    }
}

#[tokio::test]
async fn test_question_then_resume_to_summary() {
    let planner = Arc::new(
        ScriptedPlanner::new()
            .then(EkgVerdict::next(EkgNode::executable("n1", "主持人宣布开始")).with_user_interaction("**王鹏:**  <br>我先说"))
            .then(EkgVerdict::next(EkgNode::question("n42", "你投给谁?")))
            .then(EkgVerdict::finished("游戏结束，好人胜利")),
    );
    let scheduler = Arc::new(RecordingScheduler::default());
    let controller = controller_with(planner.clone(), scheduler.clone(), TurnSettings::default());

    let events = run(&controller, ConversationInput::fresh("start task")).await;
    assert_eq!(events.len(), 2);
    match &events[0].content {
        EventContent::Role(role) => {
            assert_eq!(role.role, Speaker::Wangpeng);
            assert_eq!(role.text, "我先说");
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(events[0].continuation().is_none());
    match &events[1].content {
        EventContent::Role(role) => {
            assert_eq!(role.role, Speaker::Referee);
            assert!(role.text.ends_with("你投给谁?"));
            assert!(role.text.contains("请回答"));
        }
        other => panic!("unexpected event {:?}", other),
    }

    let queries = planner.queries();
    assert_eq!(queries.len(), 2);
    let session = queries[0].session_id.clone();
    assert_eq!(queries[1].session_id, session);
    assert_eq!(queries[1].current_node_id.as_deref(), Some("n1"));
    assert!(queries[1].start_root_node_id.is_none());
    assert!(queries[1].intention_seed.is_none());
    let observation: serde_json::Value = serde_json::from_str(&queries[1].observation).unwrap();
    assert_eq!(observation["toolKey"], "speak");
    assert_eq!(observation["toolResponse"], "done: 主持人宣布开始");
    assert_eq!(scheduler.calls(), 1);

    let token = events[1].continuation().unwrap().to_string();
    let state = continuation::decode(&token).unwrap();
    assert_eq!(state.current_node_id, "n42");
    assert_eq!(state.session_id, session);
    assert_eq!(state.node_type, NodeType::UserQuestion);

    // 下一轮带回令牌作答
    let events = run(&controller, ConversationInput::resume("王鹏", token)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].body(), "游戏结束，好人胜利");
    assert!(matches!(events[0].content, EventContent::Text { .. }));
    assert!(events[0].continuation().is_none());

    let queries = planner.queries();
    assert_eq!(queries.len(), 3);
    let resumed = &queries[2];
    assert_eq!(resumed.session_id, session);
    assert_eq!(resumed.current_node_id.as_deref(), Some("n42"));
    assert_eq!(resumed.user_answer.as_deref(), Some(r#"{"toolResponse":"王鹏"}"#));
}

#[tokio::test]
async fn test_fresh_start_query_shape() {
    let planner = Arc::new(ScriptedPlanner::new().then(EkgVerdict::finished("done")));
    let controller = controller_with(
        planner.clone(),
        Arc::new(RecordingScheduler::default()),
        TurnSettings::default(),
    );

    run(&controller, ConversationInput::fresh("start task")).await;

    let query = &planner.queries()[0];
    assert_eq!(query.start_root_node_id.as_deref(), Some("ekg_team_default"));
    assert_eq!(query.intention_seed, Some(vec!["start task".to_string()]));
    assert!(query.current_node_id.is_none());
    assert!(query.user_answer.is_none());
}

#[tokio::test]
async fn test_resume_query_shape() {
    let planner = Arc::new(ScriptedPlanner::new().then(EkgVerdict::finished("done")));
    let controller = controller_with(
        planner.clone(),
        Arc::new(RecordingScheduler::default()),
        TurnSettings::default(),
    );
    let token = continuation::encode(&ContinuationState::new("n42", "s1", NodeType::UserQuestion)).unwrap();

    run(&controller, ConversationInput::resume("yes", token)).await;

    let query = &planner.queries()[0];
    assert_eq!(query.session_id, "s1");
    assert_eq!(query.current_node_id.as_deref(), Some("n42"));
    assert_eq!(query.user_answer.as_deref(), Some(r#"{"toolResponse":"yes"}"#));
    assert!(query.start_root_node_id.is_none());
}

#[tokio::test]
async fn test_summary_stops_immediately() {
    let planner = Arc::new(
        ScriptedPlanner::new()
            .then(EkgVerdict::finished("游戏结束").with_user_interaction("**李静:** 再见"))
            .then(EkgVerdict::finished("never read")),
    );
    let scheduler = Arc::new(RecordingScheduler::default());
    let controller = controller_with(planner.clone(), scheduler.clone(), TurnSettings::default());

    let events = run(&controller, ConversationInput::fresh("start")).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].body(), "游戏结束");
    assert!(events[0].continuation().is_none());
    assert_eq!(planner.call_count(), 1);
    assert_eq!(scheduler.calls(), 0);
}

#[tokio::test]
async fn test_empty_planner_response_is_one_error() {
    let planner = Arc::new(ScriptedPlanner::new().then_err(PlannerError::EmptyResponse));
    let scheduler = Arc::new(RecordingScheduler::default());
    let controller = controller_with(planner.clone(), scheduler.clone(), TurnSettings::default());

    let events = run(&controller, ConversationInput::fresh("start")).await;

    assert_eq!(events.len(), 1);
    assert_eq!(error_code(&events[0]), Some(ErrorCode::PlannerFailure));
    assert_eq!(events[0].body(), "图谱执行异常");
    assert_eq!(scheduler.calls(), 0);
}

#[tokio::test]
async fn test_invalid_token_is_rejected_without_planner_call() {
    let planner = Arc::new(ScriptedPlanner::new().then(EkgVerdict::finished("done")));
    let controller = controller_with(
        planner.clone(),
        Arc::new(RecordingScheduler::default()),
        TurnSettings::default(),
    );

    let events = run(&controller, ConversationInput::resume("yes", "v1.!!not-base64!!")).await;

    assert_eq!(events.len(), 1);
    assert_eq!(error_code(&events[0]), Some(ErrorCode::InvalidContinuation));
    assert_eq!(planner.call_count(), 0);
}

#[tokio::test]
async fn test_executor_failure_aborts_turn() {
    let planner = Arc::new(
        ScriptedPlanner::new()
            .then(EkgVerdict::next(EkgNode::executable("n1", "发言")))
            .then(EkgVerdict::finished("never read")),
    );
    let scheduler = Arc::new(RecordingScheduler::failing());
    let controller = controller_with(planner.clone(), scheduler.clone(), TurnSettings::default());

    let events = run(&controller, ConversationInput::fresh("start")).await;

    assert_eq!(events.len(), 1);
    assert_eq!(error_code(&events[0]), Some(ErrorCode::TurnAborted));
    assert_eq!(planner.call_count(), 1);
    assert_eq!(scheduler.calls(), 1);
}

#[tokio::test]
async fn test_empty_plan_aborts_turn() {
    let planner = Arc::new(ScriptedPlanner::new().then(EkgVerdict::default()));
    let controller = controller_with(
        planner.clone(),
        Arc::new(RecordingScheduler::default()),
        TurnSettings::default(),
    );

    let events = run(&controller, ConversationInput::fresh("start")).await;

    assert_eq!(events.len(), 1);
    assert_eq!(error_code(&events[0]), Some(ErrorCode::TurnAborted));
}

#[tokio::test]
async fn test_step_limit() {
    let planner = Arc::new(
        ScriptedPlanner::new()
            .then(EkgVerdict::next(EkgNode::executable("n1", "a")))
            .then(EkgVerdict::next(EkgNode::executable("n2", "b")))
            .then(EkgVerdict::next(EkgNode::executable("n3", "c"))),
    );
    let scheduler = Arc::new(RecordingScheduler::default());
    let settings = TurnSettings {
        max_steps: 2,
        ..TurnSettings::default()
    };
    let controller = controller_with(planner.clone(), scheduler.clone(), settings);

    let events = run(&controller, ConversationInput::fresh("start")).await;

    assert_eq!(events.len(), 1);
    assert_eq!(error_code(&events[0]), Some(ErrorCode::TurnAborted));
    assert_eq!(planner.call_count(), 2);
    assert_eq!(scheduler.calls(), 2);
}

#[tokio::test]
async fn test_closed_sink_makes_no_calls() {
    let planner = Arc::new(ScriptedPlanner::new().then(EkgVerdict::finished("done")));
    let controller = controller_with(
        planner.clone(),
        Arc::new(RecordingScheduler::default()),
        TurnSettings::default(),
    );
    let (sink, rx) = ChannelSink::new();
    drop(rx);

    controller.run_turn(ConversationInput::fresh("start"), sink).await;

    assert_eq!(planner.call_count(), 0);
}

#[tokio::test]
async fn test_disconnect_during_execution_abandons_turn() {
    let planner = Arc::new(
        ScriptedPlanner::new()
            .then(EkgVerdict::next(EkgNode::executable("n1", "发言")))
            .then(EkgVerdict::finished("never read")),
    );
    let scheduler = Arc::new(HangingScheduler::default());
    let controller = Arc::new(controller_with(planner.clone(), scheduler.clone(), TurnSettings::default()));

    let (sink, rx) = ChannelSink::new();
    let turn = tokio::spawn({
        let controller = controller.clone();
        async move { controller.run_turn(ConversationInput::fresh("start"), sink).await }
    });

    scheduler.started.notified().await;
    drop(rx);

    tokio::time::timeout(Duration::from_secs(5), turn)
        .await
        .expect("turn should stop after disconnect")
        .unwrap();
    assert_eq!(planner.call_count(), 1);
}

struct PanickingScheduler;

#[async_trait]
impl Scheduler for PanickingScheduler {
    async fn submit_task(&self, _request: SubmitTaskRequest) -> Result<TaskExeResponse, SchedulerError> {
        panic!("scheduler bug")
    }
}

#[tokio::test]
async fn test_panic_is_contained_in_turn() {
    let planner = Arc::new(ScriptedPlanner::new().then(EkgVerdict::next(EkgNode::executable("n1", "发言"))));
    let controller = controller_with(planner, Arc::new(PanickingScheduler), TurnSettings::default());

    let events = run(&controller, ConversationInput::fresh("start")).await;

    assert_eq!(events.len(), 1);
    assert_eq!(error_code(&events[0]), Some(ErrorCode::TurnAborted));
}

#[tokio::test]
async fn test_long_question_still_pauses_with_token() {
    let question = "请".repeat(2500);
    let planner = Arc::new(ScriptedPlanner::new().then(EkgVerdict::next(EkgNode::question("n42", question.clone()))));
    let controller = controller_with(planner, Arc::new(RecordingScheduler::default()), TurnSettings::default());

    let events = run(&controller, ConversationInput::fresh("start")).await;

    assert_eq!(events.len(), 1);
    assert!(events[0].body().ends_with(&question));
    let token = events[0].continuation().unwrap();
    let state = continuation::decode(token).unwrap();
    assert_eq!(state.current_node_id, "n42");
    assert_eq!(state.node_type, NodeType::UserQuestion);
}

/// 图谱调用开始后永不返回
#[derive(Default)]
struct HangingPlanner {
    started: Notify,
}

#[async_trait]
impl PlannerClient for HangingPlanner {
    async fn query(&self, _query: &EkgQuery) -> Result<EkgVerdict, PlannerError> {
        self.started.notify_one();
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_disconnect_during_planner_call_abandons_turn() {
    let planner = Arc::new(HangingPlanner::default());
    let scheduler = Arc::new(RecordingScheduler::default());
    let manager = SchedulerManager::new().with(SchedulerKind::Common, scheduler.clone());
    let controller = Arc::new(TurnController::new(
        planner.clone(),
        NodeExecutor::new(manager, Vec::new()),
        TurnSettings::default(),
    ));

    let (sink, rx) = ChannelSink::new();
    let turn = tokio::spawn({
        let controller = controller.clone();
        async move { controller.run_turn(ConversationInput::fresh("start"), sink).await }
    });

    planner.started.notified().await;
    drop(rx);

    tokio::time::timeout(Duration::from_secs(5), turn)
        .await
        .expect("turn should stop after disconnect")
        .unwrap();
    assert_eq!(scheduler.calls(), 0);
}
