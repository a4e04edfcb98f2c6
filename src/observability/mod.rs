//! 可观测性：tracing 订阅器初始化
//!
//! 默认 info 级别，可用 `RUST_LOG` 覆盖（如 `RUST_LOG=ekg_digest=info,ekg_chat=debug`）。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // 重复初始化（如测试中）时保留已有订阅器
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
