//! 图谱规划层：客户端抽象、HTTP 实现、请求/响应结构与调用摘要

pub mod digest;
pub mod http;
pub mod mock;
pub mod traits;
pub mod types;

pub use digest::DigestGuard;
pub use http::{parse_planner_response, HttpPlanner};
pub use mock::ScriptedPlanner;
pub use traits::{PlannerClient, PlannerError};
pub use types::{EkgNode, EkgQuery, EkgVerdict, NodeType, QuestionContent, QuestionDescription, ToolResponse};
