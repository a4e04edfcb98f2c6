//! 图谱调用摘要日志
//!
//! DigestGuard 在调用开始时创建，Drop 时输出一行摘要，保证成功、失败、提前返回乃至调用被取消时都有记录。
//! 格式：`[ekg_digest]<Y|N>^<耗时ms>^<sessionId>^<algoErr>^<sysErr>^`，
//! 末尾的 `^` 保留给监控采集的左起右至切分规则。

use std::time::Instant;

use crate::planner::PlannerError;

/// 调用在得出结果前被丢弃（如调用方断开）
const CANCELLED: &str = "ALGO_CALL_CANCELLED";
/// algoErr 列：图谱不回传算法侧错误码，固定占位以保持采集端的列位
const ALGO_ERR_PLACEHOLDER: &str = "-";

pub struct DigestGuard<'a> {
    session_id: &'a str,
    start: Instant,
    success: bool,
    sys_err: &'static str,
}

impl<'a> DigestGuard<'a> {
    pub fn start(session_id: &'a str) -> Self {
        Self {
            session_id,
            start: Instant::now(),
            success: false,
            sys_err: CANCELLED,
        }
    }

    pub fn succeed(&mut self) {
        self.success = true;
        self.sys_err = "-";
    }

    pub fn fail(&mut self, err: &PlannerError) {
        self.success = false;
        self.sys_err = err.digest_code();
    }

    fn line(&self) -> String {
        let elapsed = self.start.elapsed().as_millis().to_string();
        let fields: [&str; 6] = [
            if self.success { "Y" } else { "N" },
            elapsed.as_str(),
            self.session_id,
            ALGO_ERR_PLACEHOLDER,
            self.sys_err,
            "",
        ];
        format!("[ekg_digest]{}", fields.join("^"))
    }
}

impl Drop for DigestGuard<'_> {
    fn drop(&mut self) {
        tracing::info!(target: "ekg_digest", "{}", self.line());
    }
}
