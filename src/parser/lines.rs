use std::sync::LazyLock;

use regex::Regex;

use crate::settings::PartySettings;
use crate::util::{collapse_ws, join_ideographs};

static BARE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\p{Han}{2,4}$").unwrap());

/// One paragraph of the party listing, cleaned of run-on whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphBlock {
    pub text: String,
}

impl ParagraphBlock {
    pub fn new(raw: &str) -> Self {
        ParagraphBlock {
            text: join_ideographs(&collapse_ws(raw)),
        }
    }
}

/// What a paragraph means for the open party segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Opens a new segment.
    RoleStart,
    /// Appends to the open segment (or opens one).
    Continuation,
    /// Judgment body begins; nothing after it is a party line.
    Terminator,
    /// The open segment ends with the alias connective and this line names a role.
    AliasForward,
    /// This line starts with the alias connective and belongs to the open segment.
    AliasBackward,
    Other,
}

#[derive(Debug, Clone)]
pub struct LineClassifier {
    /// Longest first, so compound roles are seen before their substrings.
    markers: Vec<String>,
    terminators: Vec<String>,
    connective: String,
    role_suffixes: Vec<String>,
    org_suffixes: Vec<String>,
    leads: Vec<char>,
    window: usize,
    loose: bool,
}

impl LineClassifier {
    pub fn new(settings: &PartySettings) -> Self {
        let mut markers: Vec<String> = settings
            .role_markers
            .iter()
            .filter(|m| !m.is_empty())
            .cloned()
            .collect();
        markers.sort_by_key(|m| std::cmp::Reverse(m.chars().count()));
        LineClassifier {
            markers,
            terminators: settings.terminators.iter().filter(|t| !t.is_empty()).cloned().collect(),
            connective: settings.alias_connective.clone(),
            role_suffixes: settings.role_suffixes.clone(),
            org_suffixes: settings.org_suffixes.clone(),
            leads: settings.continuation_leads.clone(),
            window: settings.role_start_window,
            loose: settings.loose_continuation,
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn connective(&self) -> &str {
        &self.connective
    }

    pub fn role_suffixes(&self) -> &[String] {
        &self.role_suffixes
    }

    /// A dangling role token whose alias sits on the next paragraph:
    /// `聲請人` / `即 債務人`.
    pub fn joins_next(&self, line: &str, next: &str) -> bool {
        !self.connective.is_empty()
            && self.role_suffixes.iter().any(|s| line.trim_end().ends_with(s.as_str()))
            && next.trim_start().starts_with(self.connective.as_str())
    }

    pub fn classify(&self, line: &str, open: Option<&str>) -> LineKind {
        let line = line.trim();

        if self.has_terminator(line) {
            return LineKind::Terminator;
        }

        if let Some(buffer) = open {
            if self.ends_with_connective(buffer) && self.has_role(line) {
                return LineKind::AliasForward;
            }
            if !self.connective.is_empty() && line.starts_with(self.connective.as_str()) {
                return LineKind::AliasBackward;
            }
        }

        if self.starts_role(line) {
            return LineKind::RoleStart;
        }

        if self.continues(line) {
            return LineKind::Continuation;
        }

        LineKind::Other
    }

    pub fn ends_with_connective(&self, buffer: &str) -> bool {
        !self.connective.is_empty() && buffer.trim_end().ends_with(self.connective.as_str())
    }

    pub fn has_terminator(&self, s: &str) -> bool {
        self.terminators.iter().any(|t| s.contains(t.as_str()))
    }

    /// Byte offset of the earliest terminator phrase in `s`.
    pub fn first_terminator(&self, s: &str) -> Option<usize> {
        self.terminators.iter().filter_map(|t| s.find(t.as_str())).min()
    }

    pub fn has_role(&self, s: &str) -> bool {
        self.markers.iter().any(|m| s.contains(m.as_str()))
    }

    fn starts_role(&self, line: &str) -> bool {
        self.markers.iter().any(|m| {
            line.find(m.as_str())
                .map(|at| line[..at].chars().count() <= self.window)
                .unwrap_or(false)
        })
    }

    fn continues(&self, line: &str) -> bool {
        line.chars().next().is_some_and(|c| self.leads.contains(&c))
            || self.org_suffixes.iter().any(|s| line.ends_with(s.as_str()))
            || BARE_NAME_RE.is_match(line)
            || (self.loose && !self.has_terminator(line))
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> LineClassifier {
        LineClassifier::new(&PartySettings::default())
    }

    fn strict() -> LineClassifier {
        LineClassifier::new(&PartySettings {
            loose_continuation: false,
            ..PartySettings::default()
        })
    }

    #[test]
    fn paragraph_cleanup() {
        let p = ParagraphBlock::new("  聲 請 人\u{a0} 王 小 明 \n");
        assert_eq!(p.text, "聲請人王小明");
    }

    #[test]
    fn role_start_within_window() {
        let c = classifier();
        assert_eq!(c.classify("聲請人 王小明", None), LineKind::RoleStart);
        assert_eq!(c.classify("共同 法定代理人 李四", None), LineKind::RoleStart);
    }

    #[test]
    fn role_too_deep_is_not_a_start() {
        let c = strict();
        assert_eq!(
            c.classify("住臺北市中正區重慶南路一段的債權人", None),
            LineKind::Other
        );
    }

    #[test]
    fn terminator_wins_over_role() {
        let c = classifier();
        assert_eq!(c.classify("上列聲請人與相對人間", Some("聲請人 甲")), LineKind::Terminator);
        assert_eq!(c.classify("主文", None), LineKind::Terminator);
    }

    #[test]
    fn alias_forward_needs_open_connective() {
        let c = classifier();
        assert_eq!(c.classify("債務人", Some("聲請人 甲 即")), LineKind::AliasForward);
        assert_eq!(c.classify("債務人", Some("聲請人 甲")), LineKind::RoleStart);
    }

    #[test]
    fn alias_backward_only_with_open_buffer() {
        let c = classifier();
        assert_eq!(c.classify("即債務人", Some("聲請人 甲")), LineKind::AliasBackward);
        // No buffer: the role marker sits within the window.
        assert_eq!(c.classify("即債務人", None), LineKind::RoleStart);
    }

    #[test]
    fn continuation_heuristics() {
        let c = strict();
        assert_eq!(c.classify("、王五", Some("被告 甲")), LineKind::Continuation);
        assert_eq!(c.classify("台灣積體電路製造股份有限公司", Some("原告")), LineKind::Continuation);
        assert_eq!(c.classify("王小明", Some("原告")), LineKind::Continuation);
        assert_eq!(c.classify("住臺北市中正區", Some("原告 甲")), LineKind::Other);
        assert_eq!(classifier().classify("住臺北市中正區", Some("原告 甲")), LineKind::Continuation);
    }

    #[test]
    fn lookahead_join() {
        let c = classifier();
        assert!(c.joins_next("聲請人", "即 債務人"));
        assert!(c.joins_next("代理人 陳大文律師", "即 送達代收人"));
        assert!(!c.joins_next("聲請人 甲", "即 債務人"));
        assert!(!c.joins_next("聲請人", "相對人 乙"));
    }

    #[test]
    fn first_terminator_offset() {
        let c = classifier();
        let s = "甲 主文 理由";
        assert_eq!(c.first_terminator(s), s.find("主文"));
        assert_eq!(c.first_terminator("甲"), None);
    }

    #[test]
    fn markers_sorted_longest_first() {
        let c = classifier();
        let lens: Vec<usize> = c.markers().iter().map(|m| m.chars().count()).collect();
        assert!(lens.windows(2).all(|w| w[0] >= w[1]));
    }
}
