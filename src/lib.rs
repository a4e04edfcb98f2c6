//! EKG Chat - 图谱驱动的对话编排
//!
//! 模块划分：
//! - **chat**: 请求 / 事件 / 事件出口，以及按发言人标记路由消息内容
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 续接令牌、错误分类、单轮主控循环
//! - **planner**: 图谱规划服务客户端（HTTP / 脚本化 Mock）与调用摘要日志
//! - **scheduler**: 任务调度器抽象与节点执行器

pub mod chat;
pub mod config;
pub mod core;
pub mod observability;
pub mod planner;
pub mod scheduler;

pub use crate::core::{TurnController, TurnError};
