use regex::Regex;
use serde::Serialize;

use crate::settings::SectionSettings;

/// Horizontal whitespace only: a heading must sit on its own line.
const HSPACE: &str = r"[^\S\r\n]*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub body: String,
}

/// Splits a judgment body into titled sections at three heading levels:
/// named top-level headings, ceremonial numerals (`壹、`) and ordinary
/// numerals (`一、`).
#[derive(Debug, Clone)]
pub struct SectionDecomposer {
    heading_re: Regex,
    closing_re: Regex,
    default_title: String,
}

impl SectionDecomposer {
    pub fn new(settings: &SectionSettings) -> Result<Self, regex::Error> {
        let top = settings
            .top_headings
            .iter()
            .map(|h| spaced(h, HSPACE))
            .collect::<Vec<_>>();
        let sep = regex::escape(&settings.separator);
        let numbered = |numerals: &[String]| {
            numerals
                .iter()
                .map(|n| format!("{}{}", regex::escape(n), sep))
                .collect::<Vec<_>>()
        };
        let levels = [top, numbered(&settings.ceremonial_numerals), numbered(&settings.ordinary_numerals)]
            .concat()
            .join("|");
        let levels = or_never(levels);
        let heading_re = Regex::new(&format!(
            r"(?m)^{h}(?:{levels}){h}$",
            h = HSPACE,
            levels = levels
        ))?;

        let closing = settings
            .closing_markers
            .iter()
            .map(|m| spaced(m, r"\s*"))
            .collect::<Vec<_>>()
            .join("|");
        let closing_re = Regex::new(&format!("(?:{})", or_never(closing)))?;

        Ok(SectionDecomposer {
            heading_re,
            closing_re,
            default_title: settings.default_title.clone(),
        })
    }

    /// Sections in document order. Bodies never contain their heading and the
    /// last body stops before the signature block.
    pub fn decompose(&self, text: &str) -> Vec<Section> {
        let text = text.replace("\r\n", "\n");
        let headings: Vec<_> = self.heading_re.find_iter(&text).collect();

        if headings.is_empty() {
            return vec![Section {
                title: self.default_title.clone(),
                body: self.cut_footer(&text).trim().to_string(),
            }];
        }

        let mut sections = Vec::with_capacity(headings.len());
        for (i, m) in headings.iter().enumerate() {
            let end = headings.get(i + 1).map(|n| n.start()).unwrap_or(text.len());
            let mut body = &text[m.end()..end];
            if i + 1 == headings.len() {
                body = self.cut_footer(body);
            }
            sections.push(Section {
                title: m.as_str().split_whitespace().collect(),
                body: body.trim().to_string(),
            });
        }
        sections
    }

    fn cut_footer<'a>(&self, text: &'a str) -> &'a str {
        match self.closing_re.find(text) {
            Some(m) => &text[..m.start()],
            None => text,
        }
    }
}

/// An empty alternation would match everywhere.
fn or_never(alternation: String) -> String {
    if alternation.is_empty() {
        r"[^\s\S]".to_string()
    } else {
        alternation
    }
}

/// `主文` → `主\s*文`, tolerating spacing between characters.
fn spaced(word: &str, gap: &str) -> String {
    word.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| regex::escape(&c.to_string()))
        .collect::<Vec<_>>()
        .join(gap)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn decomposer() -> SectionDecomposer {
        SectionDecomposer::new(&SectionSettings::default()).unwrap()
    }

    fn titles(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn no_headings_single_section() {
        let text = "聲請人聲請支付命令，核無不合。\n中華民國 112 年 5 月 3 日\n司法事務官 王小明";
        let sections = decomposer().decompose(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "全文");
        assert_eq!(sections[0].body, "聲請人聲請支付命令，核無不合。");
    }

    #[test]
    fn spaced_closing_marker_is_found() {
        let text = "本件駁回。\n中 華 民 國 112 年 5 月 3 日";
        let sections = decomposer().decompose(text);
        assert_eq!(sections[0].body, "本件駁回。");
    }

    #[test]
    fn three_levels_in_order() {
        let text = "臺灣臺北地方法院民事判決\n主 文\n原告之訴駁回。\n事實及理由\n理  由\n壹、\n程序方面\n一、\n原告起訴。\n二、\n被告未到庭。\n中華民國112年5月3日\n法官 李大同";
        let sections = decomposer().decompose(text);
        assert_eq!(titles(&sections), vec!["主文", "理由", "壹、", "一、", "二、"]);
        assert_eq!(sections[0].body, "原告之訴駁回。\n事實及理由");
        assert_eq!(sections[2].body, "程序方面");
        assert_eq!(sections[4].body, "被告未到庭。");
    }

    #[test]
    fn heading_inside_a_sentence_is_not_a_heading() {
        let text = "主文\n依理由所述，一、二項均駁回。";
        let sections = decomposer().decompose(text);
        assert_eq!(titles(&sections), vec!["主文"]);
        assert_eq!(sections[0].body, "依理由所述，一、二項均駁回。");
    }

    #[test]
    fn bodies_never_hold_headings() {
        let text = "主文\n甲\n理由\n乙\n一、\n丙";
        for s in decomposer().decompose(text) {
            assert!(!s.body.contains(&s.title), "{:?}", s);
        }
    }

    #[test]
    fn reconstructs_text_up_to_whitespace_and_footer() {
        let text = "主文\n聲請駁回。\n理由\n一、\n本件聲請不合法。\n二、\n爰裁定如主文。\n中華民國 113 年 1 月 2 日\n書記官 陳某";
        let sections = decomposer().decompose(text);
        assert_eq!(sections.len(), 4);
        let rebuilt: String = sections
            .iter()
            .map(|s| format!("{}{}", s.title, s.body))
            .collect::<String>();
        let expected: String = text
            .split("中華民國")
            .next()
            .unwrap()
            .split_whitespace()
            .collect();
        let rebuilt: String = rebuilt.split_whitespace().collect();
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn crlf_input() {
        let sections = decomposer().decompose("主文\r\n駁回。\r\n理由\r\n如下。");
        assert_eq!(titles(&sections), vec!["主文", "理由"]);
        assert_eq!(sections[1].body, "如下。");
    }

    #[test]
    fn custom_headings() {
        let settings = SectionSettings {
            top_headings: vec!["Main Holding".into(), "Facts".into()],
            ..SectionSettings::default()
        };
        let d = SectionDecomposer::new(&settings).unwrap();
        let sections = d.decompose("Main Holding\nDismissed.\nFacts\nThe applicant filed.");
        assert_eq!(titles(&sections), vec!["MainHolding", "Facts"]);
    }
}
