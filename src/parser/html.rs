use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::lines::ParagraphBlock;
use crate::util::normalize_roc_date;

const JUNK_SELECTORS: &[&str] = &[
    "#qouteurl", ".btn", ".related", ".footer", ".lawlist", ".noprint", ".share",
    ".function", ".nav", ".breadcrumb", ".header", ".announce",
];
const BODY_SELECTORS: &[&str] = &["#jud-content", ".jud", "div.card-block", "div#content"];
const PAGE_TEXT_CAP: usize = 15_000;

static PARAGRAPH_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[id^="paragraph_"], div[id^="pasted_paragraph_"], div[id^="new_paragraph_"]"#)
        .unwrap()
});
static LABEL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.col-th").unwrap());
static VALUE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.col-td").unwrap());

// Annotation markup splits role words: <abbr title="..">聲請</abbr>人
static ABBR_ROLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<abbr[^>]*>([^<]*)</abbr>\s*(人|律師)").unwrap());
static ABBR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<abbr[^>]*>([^<]*)</abbr>").unwrap());

/// What the record pipeline needs from one judgment detail page.
#[derive(Debug, Clone, Default)]
pub struct DetailPage {
    /// Raw citation string (裁判字號).
    pub title: String,
    pub date: String,
    pub cause: String,
    pub paragraphs: Vec<ParagraphBlock>,
    pub body_text: String,
}

pub fn read_detail(html: &str) -> DetailPage {
    let mut doc = Html::parse_document(html);
    strip_junk(&mut doc);

    let paragraphs = doc
        .select(&PARAGRAPH_SEL)
        .map(|div| ParagraphBlock::new(&paragraph_text(&div)))
        .filter(|p| !p.text.is_empty())
        .collect();

    DetailPage {
        title: label_value(&doc, "裁判字號"),
        date: normalize_roc_date(&label_value(&doc, "裁判日期")),
        cause: label_value(&doc, "裁判案由"),
        paragraphs,
        body_text: body_text(&doc),
    }
}

fn strip_junk(doc: &mut Html) {
    for css in JUNK_SELECTORS {
        let Ok(sel) = Selector::parse(css) else {
            continue;
        };
        let ids: Vec<_> = doc.select(&sel).map(|e| e.id()).collect();
        for id in ids {
            if let Some(mut node) = doc.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

/// Paragraph text with annotation markup folded back into the words it split.
fn paragraph_text(div: &ElementRef) -> String {
    let inner = div.inner_html();
    let inner = ABBR_ROLE_RE.replace_all(&inner, "$1$2");
    let inner = ABBR_RE.replace_all(&inner, "$1").replace("&nbsp;", " ");
    let fragment = Html::parse_fragment(&inner);
    joined_text(fragment.root_element(), " ")
}

fn joined_text(el: ElementRef, sep: &str) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Value cell paired with the first label cell containing `label`.
fn label_value(doc: &Html, label: &str) -> String {
    doc.select(&LABEL_SEL)
        .zip(doc.select(&VALUE_SEL))
        .find(|(th, _)| joined_text(*th, "").contains(label))
        .map(|(_, td)| joined_text(td, ""))
        .unwrap_or_default()
}

fn body_text(doc: &Html) -> String {
    for css in BODY_SELECTORS {
        let Ok(sel) = Selector::parse(css) else {
            continue;
        };
        if let Some(node) = doc.select(&sel).next() {
            return joined_text(node, "\n");
        }
    }
    joined_text(doc.root_element(), "\n")
        .chars()
        .take(PAGE_TEXT_CAP)
        .collect()
}

/// Busy or throttling notice on a fetched page.
pub fn is_busy(html: &str, messages: &[String]) -> bool {
    messages.iter().any(|m| !m.is_empty() && html.contains(m.as_str()))
}
