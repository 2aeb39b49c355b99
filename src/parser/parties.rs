//! Party-role segmentation: paragraph blocks → role → descriptions.
//!
//! Two steps. First a small state machine with one open-buffer register
//! folds classified paragraphs into segments, one logical statement about one
//! or more roles each. Then every segment is searched for role markers and
//! the text after each marker becomes that role's description.

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::lines::{LineClassifier, LineKind, ParagraphBlock};
use crate::settings::PartySettings;
use crate::util::collapse_ws;

const BRACKETS: &[char] = &['(', ')', '（', '）', '[', ']'];
const EDGE_PUNCT: &[char] = &[' ', ',', ';', '；', '、'];

/// Role → descriptions, keyed in the configured marker order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyRecord {
    entries: Vec<(String, Vec<String>)>,
}

impl PartyRecord {
    pub fn with_roles(roles: &[String]) -> Self {
        PartyRecord {
            entries: roles.iter().map(|r| (r.clone(), Vec::new())).collect(),
        }
    }

    /// Adds a description unless an equal one (ignoring spacing) is present.
    fn push(&mut self, role: &str, description: &str) {
        let description = collapse_ws(description);
        let description = description.trim_matches(EDGE_PUNCT);
        if description.is_empty() {
            return;
        }
        if let Some((_, values)) = self.entries.iter_mut().find(|(r, _)| r == role) {
            if !values.iter().any(|v| v == description) {
                values.push(description.to_string());
            }
        }
    }

    pub fn descriptions(&self, role: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// Stored form: descriptions joined with `, `; empty when none.
    pub fn joined(&self, role: &str) -> String {
        self.descriptions(role).join(", ")
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(r, _)| r.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.is_empty())
    }
}

impl Serialize for PartyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (role, values) in &self.entries {
            map.serialize_entry(role, &values.join(", "))?;
        }
        map.end()
    }
}

#[derive(Debug, Clone)]
pub struct PartyRoleExtractor {
    classifier: LineClassifier,
    roles: Vec<String>,
    alias_re: Option<Regex>,
    min_chars: usize,
    max_chars: usize,
}

impl PartyRoleExtractor {
    pub fn new(settings: &PartySettings) -> Result<Self, regex::Error> {
        let classifier = LineClassifier::new(settings);
        let suffixes: Vec<String> = classifier
            .role_suffixes()
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| regex::escape(s))
            .collect();
        let alias_re = if classifier.connective().is_empty() || suffixes.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(
                r"{}\s*([^\s,，、]{{1,6}}?(?:{}))",
                regex::escape(classifier.connective()),
                suffixes.join("|")
            ))?)
        };
        Ok(PartyRoleExtractor {
            classifier,
            roles: settings.role_markers.clone(),
            alias_re,
            min_chars: settings.min_description_chars,
            max_chars: settings.max_description_chars,
        })
    }

    pub fn extract(&self, paragraphs: &[ParagraphBlock]) -> PartyRecord {
        let mut record = PartyRecord::with_roles(&self.roles);
        for segment in self.segments(paragraphs) {
            self.extract_segment(&segment, &mut record);
        }
        record
    }

    /// Fold paragraphs into role segments, stopping at the judgment body.
    pub fn segments(&self, paragraphs: &[ParagraphBlock]) -> Vec<String> {
        let lines: Vec<&str> = paragraphs
            .iter()
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .collect();
        let connective = self.classifier.connective();
        let mut segments = Vec::new();
        let mut open: Option<String> = None;

        for (i, &current) in lines.iter().enumerate() {
            let line = match lines.get(i + 1) {
                Some(next) if self.classifier.joins_next(current, next) => {
                    format!("{} {}", current, next)
                }
                _ => current.to_string(),
            };

            match self.classifier.classify(&line, open.as_deref()) {
                LineKind::Terminator => {
                    emit(&mut segments, open.take());
                    break;
                }
                LineKind::AliasForward => {
                    if let Some(buffer) = open.as_mut() {
                        let head = buffer.trim_end().trim_end_matches(connective).trim_end().to_string();
                        *buffer = format!("{} {} {}", head, connective, line);
                    }
                }
                LineKind::AliasBackward => {
                    if let Some(buffer) = open.as_mut() {
                        // Already pulled in by the lookahead join.
                        if !buffer.contains(line.as_str()) {
                            buffer.push(' ');
                            buffer.push_str(&line);
                        }
                    }
                }
                LineKind::RoleStart => {
                    emit(&mut segments, open.replace(line));
                }
                LineKind::Continuation => match open.as_mut() {
                    Some(buffer) => {
                        buffer.push(' ');
                        buffer.push_str(&line);
                    }
                    None => open = Some(line),
                },
                LineKind::Other => emit(&mut segments, open.take()),
            }
        }
        emit(&mut segments, open);
        segments
    }

    fn extract_segment(&self, segment: &str, record: &mut PartyRecord) {
        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut matched: Vec<(&str, usize)> = Vec::new();

        for marker in self.classifier.markers() {
            let free = segment
                .match_indices(marker.as_str())
                .map(|(at, _)| (at, at + marker.len()))
                .find(|&(s, e)| !claimed.iter().any(|&(cs, ce)| cs <= s && e <= ce));
            if let Some((_, end)) = free {
                matched.push((marker.as_str(), end));
                claimed.extend(
                    segment
                        .match_indices(marker.as_str())
                        .map(|(at, _)| (at, at + marker.len())),
                );
            }
        }

        for (role, end) in matched {
            let Some(candidate) = self.candidate(&segment[end..]) else {
                continue;
            };

            if let Some((alias, cleaned)) = self.split_alias(&candidate) {
                let cleaned = strip_marker(&cleaned, role);
                if self.within_bounds(&cleaned) {
                    record.push(role, &cleaned);
                    record.push(alias, &strip_marker(&cleaned, alias));
                }
                continue;
            }

            let description = strip_marker(&candidate, role);
            if self.within_bounds(&description) {
                record.push(role, &description);
            }
        }
    }

    /// Text following a marker: brackets dropped, cut at the body, bounded.
    fn candidate(&self, after: &str) -> Option<String> {
        let mut text: String = after.chars().filter(|c| !BRACKETS.contains(c)).collect();
        if let Some(at) = self.classifier.first_terminator(&text) {
            text.truncate(at);
        }
        let text = text.trim().to_string();
        self.within_bounds(&text).then_some(text)
    }

    /// `甲 即債務人` → (`債務人`, `甲`) when the aliased token is a known role.
    fn split_alias<'a>(&'a self, candidate: &str) -> Option<(&'a str, String)> {
        let re = self.alias_re.as_ref()?;
        let caps = re.captures(candidate)?;
        let token = caps.get(1)?.as_str();
        let alias = self.roles.iter().find(|r| r.as_str() == token)?;
        let pattern = format!(
            r"{}\s*{}",
            regex::escape(self.classifier.connective()),
            regex::escape(alias)
        );
        let cleaned = match Regex::new(&pattern) {
            Ok(alias_phrase) => alias_phrase.replace_all(candidate, " ").to_string(),
            Err(_) => candidate.replacen(caps.get(0)?.as_str(), " ", 1),
        };
        Some((alias.as_str(), collapse_ws(&cleaned).trim_matches(EDGE_PUNCT).to_string()))
    }

    fn within_bounds(&self, text: &str) -> bool {
        let n = text.trim().chars().count();
        n >= self.min_chars.max(1) && n <= self.max_chars
    }
}

fn emit(segments: &mut Vec<String>, buffer: Option<String>) {
    if let Some(b) = buffer {
        let b = b.trim();
        if !b.is_empty() {
            segments.push(b.to_string());
        }
    }
}

/// A stored description never repeats the role it is stored under.
fn strip_marker(text: &str, role: &str) -> String {
    collapse_ws(&text.replace(role, " ")).trim_matches(EDGE_PUNCT).to_string()
}

// ── Tests ──
