//! 角色内容路由
//!
//! 图谱给出的交互文本里可能带有发言人标记（如 `**王鹏:**`）。按固定优先级逐个匹配，第一个命中的发言人胜出，
//! 去掉其标记及紧随的 `<br>` 分隔；都未命中时归为「裁判」。

use serde::{Deserialize, Serialize};

/// 发言人
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Wangpeng,
    Lijing,
    Zhangwei,
    /// 未带标记的文本
    Referee,
}

impl Speaker {
    pub fn display_name(&self) -> &'static str {
        match self {
            Speaker::Wangpeng => "王鹏",
            Speaker::Lijing => "李静",
            Speaker::Zhangwei => "张伟",
            Speaker::Referee => "裁判",
        }
    }
}

/// 带发言人的展示内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleContent {
    pub role: Speaker,
    pub name: String,
    pub text: String,
}

impl RoleContent {
    pub fn new(role: Speaker, text: impl Into<String>) -> Self {
        Self {
            role,
            name: role.display_name().to_string(),
            text: text.into(),
        }
    }
}

struct SpeakerMarker {
    marker: &'static str,
    delimiter: &'static str,
    speaker: Speaker,
}

/// 按优先级排列；新增发言人只需追加一行
const SPEAKER_MARKERS: &[SpeakerMarker] = &[
    SpeakerMarker {
        marker: "**王鹏:**",
        delimiter: "<br>",
        speaker: Speaker::Wangpeng,
    },
    SpeakerMarker {
        marker: "**李静:**",
        delimiter: "<br>",
        speaker: Speaker::Lijing,
    },
    SpeakerMarker {
        marker: "**张伟:**",
        delimiter: "<br>",
        speaker: Speaker::Zhangwei,
    },
];

/// 将交互文本路由为带发言人的内容
pub fn route(text: &str) -> RoleContent {
    SPEAKER_MARKERS
        .iter()
        .find(|m| text.contains(m.marker))
        .map(|m| RoleContent::new(m.speaker, strip_marker(text, m)))
        .unwrap_or_else(|| RoleContent::new(Speaker::Referee, text))
}

/// 去掉该发言人的所有标记（连同其后的空白与一个分隔符），其他发言人的标记原样保留
fn strip_marker(text: &str, m: &SpeakerMarker) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(m.marker) {
        out.push_str(&rest[..idx]);
        let after = rest[idx + m.marker.len()..].trim_start_matches([' ', '\t']);
        rest = after.strip_prefix(m.delimiter).unwrap_or(after);
    }
    out.push_str(rest);
    out.trim().to_string()
}
