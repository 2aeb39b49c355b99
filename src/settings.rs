//! Tunable marker lists and limits, layered from defaults, an optional
//! settings file and `JUDGMENT_*` environment variables.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::Config;
use serde::Deserialize;

const ENV_PREFIX: &str = "JUDGMENT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub parties: PartySettings,
    pub sections: SectionSettings,
    pub results: ResultSettings,
    pub harvest: HarvestSettings,
}

impl Settings {
    /// Load settings: serde defaults, then `path` (if given and present),
    /// then environment overrides such as `JUDGMENT_RESULTS__POLL_COUNT=10`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(p) = path {
            builder = builder.add_source(config::File::from(p).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read settings sources")?
            .try_deserialize::<Settings>()
            .context("Failed to deserialize settings")?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PartySettings {
    /// Closed set of role labels; also the key order of a `PartyRecord`.
    pub role_markers: Vec<String>,
    /// Phrases that open the judgment body. Party scanning stops at the first.
    pub terminators: Vec<String>,
    pub alias_connective: String,
    /// Endings that mark a paragraph as a dangling role token (`聲請人`, `某某律師`).
    pub role_suffixes: Vec<String>,
    pub org_suffixes: Vec<String>,
    /// Leading glyphs that continue the previous party line.
    pub continuation_leads: Vec<char>,
    /// A role marker must begin within this many characters to open a segment.
    pub role_start_window: usize,
    pub min_description_chars: usize,
    pub max_description_chars: usize,
    /// Treat any non-terminator paragraph as a continuation.
    pub loose_continuation: bool,
}

impl Default for PartySettings {
    fn default() -> Self {
        PartySettings {
            role_markers: strings(&[
                "聲請人",
                "法定代理人",
                "相對人",
                "代理人",
                "上訴人",
                "抗告人",
                "選任辯護人",
                "再抗告人",
                "訴訟代理人",
                "原告",
                "被告",
                "債務人",
                "債權人",
                "參加人",
            ]),
            terminators: strings(&[
                "上列",
                "主文",
                "理由",
                "裁定如下",
                "判決如下",
                "一、",
                "二、",
                "以上正本",
                "說明",
                "歷審裁判",
                "案件目前",
                "相關法條",
            ]),
            alias_connective: "即".to_string(),
            role_suffixes: strings(&["人", "律師"]),
            org_suffixes: strings(&["股份有限公司", "公司", "事務所", "大學", "醫院"]),
            continuation_leads: vec!['、', ',', '，', '及', '與', '或', '同', '另', '（', '('],
            role_start_window: 5,
            min_description_chars: 1,
            max_description_chars: 150,
            loose_continuation: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SectionSettings {
    /// Top-level headings; whitespace between their characters is tolerated.
    pub top_headings: Vec<String>,
    pub ceremonial_numerals: Vec<String>,
    pub ordinary_numerals: Vec<String>,
    pub separator: String,
    /// Signature-block openers; whitespace between characters is tolerated.
    pub closing_markers: Vec<String>,
    pub default_title: String,
}

impl Default for SectionSettings {
    fn default() -> Self {
        SectionSettings {
            top_headings: strings(&["主文", "事實", "理由"]),
            ceremonial_numerals: strings(&["壹", "貳", "參", "肆", "伍", "陸", "柒", "捌", "玖", "拾"]),
            ordinary_numerals: strings(&["一", "二", "三", "四", "五", "六", "七", "八", "九", "十"]),
            separator: "、".to_string(),
            closing_markers: strings(&["中華民國", "書記官", "法官", "司法事務官"]),
            default_title: "全文".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResultSettings {
    pub no_data_indicator: String,
    /// Substrings of an href that make it a judgment detail link.
    pub detail_link_patterns: Vec<String>,
    /// Regex with one capture group holding the digits of the total count.
    pub count_hint_pattern: String,
    pub default_page_size: usize,
    pub poll_interval_ms: u64,
    pub poll_count: u32,
}

impl ResultSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ResultSettings {
    fn default() -> Self {
        ResultSettings {
            no_data_indicator: "查無資料".to_string(),
            detail_link_patterns: strings(&["id=", "ty=JD", "ty=JUDBOOK"]),
            count_hint_pattern: r"共\s*([0-9,]+)\s*筆".to_string(),
            default_page_size: 20,
            poll_interval_ms: 500,
            poll_count: 40,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    pub max_pages: Option<usize>,
    pub max_details_per_page: Option<usize>,
    pub busy_messages: Vec<String>,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        HarvestSettings {
            max_pages: None,
            max_details_per_page: None,
            busy_messages: strings(&["系統忙碌中", "操作過於頻繁", "請按「重新整理」", "請稍候再試"]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
