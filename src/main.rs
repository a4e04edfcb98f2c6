//! EKG Chat 终端客户端
//!
//! 每行输入驱动一轮对话；遇到问题节点时自动保留续接令牌，下一行即作为回答。
//! `/new` 放弃当前续接重新开始，`/quit` 退出。可选参数：配置文件路径。

use std::path::PathBuf;

use anyhow::Context;
use ekg_chat::chat::{ChannelSink, ConversationInput, EventContent, OutboundEvent};
use ekg_chat::config::load_config;
use ekg_chat::core::TurnController;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ekg_chat::observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;
    tracing::info!(planner = %cfg.planner.url, executor = %cfg.executor.url, "ekg-chat started");
    let controller = TurnController::from_config(&cfg);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<String> = None;
    println!("输入内容开始对话（/new 重新开始，/quit 退出）");

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let text = line.trim();
        match text {
            "" => continue,
            "/quit" => break,
            "/new" => {
                pending = None;
                println!("-- 已重置会话 --");
                continue;
            }
            _ => {}
        }

        let input = match pending.take() {
            Some(token) => ConversationInput::resume(text, token),
            None => ConversationInput::fresh(text),
        };
        let (sink, mut rx) = ChannelSink::new();
        let printer = async {
            let mut token = None;
            while let Some(event) = rx.recv().await {
                print_event(&event);
                if let Some(t) = event.continuation() {
                    token = Some(t.to_string());
                }
            }
            token
        };
        let ((), token) = tokio::join!(controller.run_turn(input, sink), printer);
        pending = token;
    }

    Ok(())
}

fn print_event(event: &OutboundEvent) {
    match &event.content {
        EventContent::Text { text } => println!("{}", text),
        EventContent::Role(role) => println!("[{}] {}", role.name, role.text),
        EventContent::Error { code, text } => eprintln!("[error:{:?}] {}", code, text),
    }
}
