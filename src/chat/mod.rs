//! 对话接口层：请求、事件、事件出口与角色内容路由

pub mod content;
pub mod event;
pub mod request;
pub mod sink;

pub use content::{route, RoleContent, Speaker};
pub use event::{EventContent, OutboundEvent, CHAT_UNIQUE_ID_KEY, EKG_NODE_KEY};
pub use request::{ChatRequest, ConversationInput, TextContent};
pub use sink::{ChannelSink, EventSink, SinkClosed};
