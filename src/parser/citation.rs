use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<court>.+?)\s*(?P<year>\d{2,3})\s*年度\s*(?P<word>\S+?)字第\s*(?P<number>\d+)\s*號\s*(?P<kind>民事|刑事)?\s*(?P<doc>裁定|判決|裁判|命令|其他)?",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    #[default]
    #[serde(rename = "")]
    Unspecified,
    Civil,
    Criminal,
}

impl CaseType {
    fn from_label(label: &str) -> Self {
        match label {
            "民事" => CaseType::Civil,
            "刑事" => CaseType::Criminal,
            _ => CaseType::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::Unspecified => "",
            CaseType::Civil => "civil",
            CaseType::Criminal => "criminal",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgmentType {
    #[default]
    #[serde(rename = "")]
    Unspecified,
    Ruling,
    Judgment,
    Decision,
    Order,
    Other,
}

impl JudgmentType {
    fn from_label(label: &str) -> Self {
        match label {
            "裁定" => JudgmentType::Ruling,
            "判決" => JudgmentType::Judgment,
            "裁判" => JudgmentType::Decision,
            "命令" => JudgmentType::Order,
            "其他" => JudgmentType::Other,
            _ => JudgmentType::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JudgmentType::Unspecified => "",
            JudgmentType::Ruling => "ruling",
            JudgmentType::Judgment => "judgment",
            JudgmentType::Decision => "decision",
            JudgmentType::Order => "order",
            JudgmentType::Other => "other",
        }
    }
}

/// Structured judgment identifier. A string that does not parse yields the
/// all-empty default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub court: String,
    pub year: String,
    pub docket_word: String,
    pub docket_number: String,
    pub case_type: CaseType,
    pub judgment_type: JudgmentType,
}

impl Citation {
    pub fn parse(raw: &str) -> Self {
        let Some(caps) = CITATION_RE.captures(raw.trim()) else {
            return Citation::default();
        };
        let group = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        };
        Citation {
            court: group("court"),
            year: group("year"),
            docket_word: group("word"),
            docket_number: group("number"),
            case_type: CaseType::from_label(&group("kind")),
            judgment_type: JudgmentType::from_label(&group("doc")),
        }
    }

    /// `court-year-word-number`, skipping empty parts.
    pub fn key(&self) -> String {
        [&self.court, &self.year, &self.docket_word, &self.docket_number]
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn is_empty(&self) -> bool {
        *self == Citation::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn district_court_civil_judgment() {
        let c = Citation::parse("臺灣臺北地方法院112年度訴字第123號民事判決");
        assert_eq!(c.court, "臺灣臺北地方法院");
        assert_eq!(c.year, "112");
        assert_eq!(c.docket_word, "訴");
        assert_eq!(c.docket_number, "123");
        assert_eq!(c.case_type, CaseType::Civil);
        assert_eq!(c.judgment_type, JudgmentType::Judgment);
        assert_eq!(c.key(), "臺灣臺北地方法院-112-訴-123");
    }

    #[test]
    fn spaced_criminal_ruling() {
        let c = Citation::parse("臺灣高等法院 99 年度 抗字第 45 號 刑事裁定");
        assert_eq!(c.court, "臺灣高等法院");
        assert_eq!(c.year, "99");
        assert_eq!(c.docket_word, "抗");
        assert_eq!(c.docket_number, "45");
        assert_eq!(c.case_type, CaseType::Criminal);
        assert_eq!(c.judgment_type, JudgmentType::Ruling);
    }

    #[test]
    fn optional_tags_may_be_missing() {
        let c = Citation::parse("最高法院113年度台上字第7號");
        assert_eq!(c.docket_word, "台上");
        assert_eq!(c.case_type, CaseType::Unspecified);
        assert_eq!(c.judgment_type, JudgmentType::Unspecified);
    }

    #[test]
    fn malformed_is_all_empty() {
        let c = Citation::parse("not a citation");
        assert!(c.is_empty());
        assert_eq!(c.key(), "");
        let c = Citation::parse("");
        assert!(c.is_empty());
    }

    #[test]
    fn serializes_empty_tags_as_empty_strings() {
        let json = serde_json::to_value(Citation::default()).unwrap();
        assert_eq!(json["case_type"], "");
        assert_eq!(json["judgment_type"], "");
        let json = serde_json::to_value(Citation::parse("臺灣臺北地方法院112年度司促字第1號民事裁定")).unwrap();
        assert_eq!(json["case_type"], "civil");
        assert_eq!(json["judgment_type"], "ruling");
        assert_eq!(json["docket_word"], "司促");
    }
}
