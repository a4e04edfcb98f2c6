//! 任务调度层：调度器抽象、注册表、HTTP 实现与节点执行器

pub mod executor;
pub mod http;
pub mod manager;
pub mod traits;
pub mod types;

pub use executor::NodeExecutor;
pub use http::HttpScheduler;
pub use manager::SchedulerManager;
pub use traits::{Scheduler, SchedulerError};
pub use types::{ExecutionResult, SchedulerKind, SubmitTaskRequest, TaskExeResponse};
