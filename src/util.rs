//! Small text and URL helpers shared by the parser and the harvester.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use regex::Regex;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static CJK_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\p{Han}])\s+([\p{Han}])").unwrap());
static ROC_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"民國\s*(\d{2,3})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日").unwrap()
});

const TAIPEI_OFFSET_SECS: i32 = 8 * 3600;

/// Collapse runs of whitespace (including `&nbsp;`) to one space and trim.
pub fn collapse_ws(s: &str) -> String {
    WS_RE.replace_all(&s.replace('\u{a0}', " "), " ").trim().to_string()
}

/// Remove whitespace sitting between two ideographs: `聲 請 人` → `聲請人`.
pub fn join_ideographs(s: &str) -> String {
    // Matches overlap on single-character runs, so repeat until stable.
    let mut out = s.to_string();
    loop {
        let next = CJK_GAP_RE.replace_all(&out, "$1$2").to_string();
        if next == out {
            return out;
        }
        out = next;
    }
}

/// Drop the `ot` query parameter (and a dangling `?`) from a detail URL.
pub fn canonical_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    let (rest, fragment) = match url.split_once('#') {
        Some((r, f)) => (r, Some(f)),
        None => (url, None),
    };
    let mut out = match rest.split_once('?') {
        Some((base, query)) => {
            let kept: Vec<&str> = query
                .split('&')
                .filter(|pair| !pair.is_empty())
                .filter(|pair| pair.split('=').next() != Some("ot"))
                .collect();
            if kept.is_empty() {
                base.to_string()
            } else {
                format!("{}?{}", base, kept.join("&"))
            }
        }
        None => rest.trim_end_matches('?').to_string(),
    };
    if let Some(f) = fragment {
        out.push('#');
        out.push_str(f);
    }
    out
}

/// Rewrite ROC calendar dates (`民國112年5月3日`) as `112/05/03`.
pub fn normalize_roc_date(raw: &str) -> String {
    ROC_DATE_RE
        .replace_all(raw, |caps: &regex::Captures| {
            let y: u32 = caps[1].parse().unwrap_or(0);
            let m: u32 = caps[2].parse().unwrap_or(0);
            let d: u32 = caps[3].parse().unwrap_or(0);
            format!("{}/{:02}/{:02}", y, m, d)
        })
        .trim()
        .to_string()
}

/// Current wall-clock time in Taipei.
pub fn now_taipei() -> DateTime<FixedOffset> {
    let tz = FixedOffset::east_opt(TAIPEI_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    Utc::now().with_timezone(&tz)
}

pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_handles_nbsp() {
        assert_eq!(collapse_ws("  聲請人\u{a0}\u{a0} 甲 \n"), "聲請人 甲");
    }

    #[test]
    fn ideograph_gaps_removed() {
        assert_eq!(join_ideographs("聲 請 人 王 小 明"), "聲請人王小明");
        assert_eq!(join_ideographs("代理人 John Doe"), "代理人 John Doe");
        assert_eq!(join_ideographs("甲 即 債務人"), "甲即債務人");
    }

    #[test]
    fn canonical_url_drops_ot() {
        assert_eq!(
            canonical_url("https://judgment.judicial.gov.tw/FJUD/data.aspx?ty=JD&id=ABC&ot=in"),
            "https://judgment.judicial.gov.tw/FJUD/data.aspx?ty=JD&id=ABC"
        );
        assert_eq!(
            canonical_url("https://example.test/data.aspx?ot=in"),
            "https://example.test/data.aspx"
        );
        assert_eq!(canonical_url("https://example.test/a?"), "https://example.test/a");
        assert_eq!(canonical_url(""), "");
    }

    #[test]
    fn roc_date() {
        assert_eq!(normalize_roc_date("民國 112 年 5 月 3 日"), "112/05/03");
        assert_eq!(normalize_roc_date("民國99年12月31日"), "99/12/31");
        assert_eq!(normalize_roc_date("unknown"), "unknown");
    }

    #[test]
    fn timestamp_format() {
        let ts = DateTime::parse_from_rfc3339("2024-01-02T03:04:05+08:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-02 03:04:05");
        assert_eq!(now_taipei().offset().local_minus_utc(), 8 * 3600);
    }
}
