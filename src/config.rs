//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `EKG__*` 覆盖（双下划线表示嵌套，如 `EKG__PLANNER__URL=http://...`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub planner: PlannerSection,
    #[serde(default)]
    pub executor: ExecutorSection,
    #[serde(default)]
    pub web: WebSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [planner] 段：图谱规划服务地址、请求头与起始参数
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerSection {
    #[serde(default = "default_planner_url")]
    pub url: String,
    /// 请求头 MPS-app-name（调用方身份）
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// 请求头 MPS-http-version
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    /// 新会话的起始根节点
    #[serde(default = "default_root_node")]
    pub default_root_node: String,
    #[serde(default = "default_scene")]
    pub scene: String,
    /// 首次查询携带的意图识别规则
    #[serde(default = "default_intention_rules")]
    pub intention_rules: Vec<String>,
    /// HTTP 客户端超时（秒）；未设置时不限
    pub timeout_secs: Option<u64>,
    /// 单轮内最多查询图谱的次数，防止死循环
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_planner_url() -> String {
    "http://127.0.0.1:5050/ekg/graph/ekg_migration_reasoning".to_string()
}

fn default_app_name() -> String {
    "test".to_string()
}

fn default_protocol_version() -> String {
    "1.0".to_string()
}

fn default_root_node() -> String {
    "ekg_team_default".to_string()
}

fn default_scene() -> String {
    "NEXA".to_string()
}

fn default_intention_rules() -> Vec<String> {
    vec!["nlp".to_string()]
}

fn default_max_steps() -> usize {
    50
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            url: default_planner_url(),
            app_name: default_app_name(),
            protocol_version: default_protocol_version(),
            default_root_node: default_root_node(),
            scene: default_scene(),
            intention_rules: default_intention_rules(),
            timeout_secs: None,
            max_steps: default_max_steps(),
        }
    }
}

/// [executor] 段：任务调度服务地址与可用工具
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSection {
    #[serde(default = "default_executor_url")]
    pub url: String,
    /// 提交任务时允许使用的工具 key
    #[serde(default)]
    pub tool_keys: Vec<String>,
    pub timeout_secs: Option<u64>,
}

fn default_executor_url() -> String {
    "http://127.0.0.1:8081/api/task/submit".to_string()
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            url: default_executor_url(),
            tool_keys: Vec::new(),
            timeout_secs: None,
        }
    }
}

/// [web] 段：ekg-web 监听地址
#[derive(Debug, Clone, Deserialize)]
pub struct WebSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for WebSection {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// 从 config 目录加载配置，环境变量 EKG__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 EKG__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("EKG")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("planner.intention_rules")
            .with_list_parse_key("executor.tool_keys")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
