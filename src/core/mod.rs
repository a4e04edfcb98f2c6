//! 核心编排层：续接令牌、错误分类、单轮主控循环

pub mod continuation;
pub mod controller;
pub mod error;

pub use continuation::{ContinuationState, TokenError, MAX_TOKEN_LEN};
pub use controller::{TurnController, TurnEnd, TurnSettings};
pub use error::{ErrorCode, TurnError};
