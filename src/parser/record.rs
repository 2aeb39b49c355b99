use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::citation::Citation;
use super::html::DetailPage;
use super::parties::PartyRecord;
use super::sections::Section;
use crate::util::format_timestamp;

/// One judgment, assembled once and handed to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct JudgmentRecord {
    pub key: String,
    pub url: String,
    pub fetched_at: String,
    /// Citation string as printed on the page.
    pub title: String,
    pub date: String,
    pub cause: String,
    pub citation: Citation,
    pub sections: Vec<Section>,
    pub parties: PartyRecord,
    pub body_text: String,
}

/// Flat row: key, url, citation fields and creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbRow {
    pub jud_key: String,
    pub url: String,
    pub court: String,
    pub year: String,
    pub zi: String,
    pub number: String,
    pub case_type: String,
    pub judgment_type: String,
    pub created_at: String,
}

impl JudgmentRecord {
    pub fn db_row(&self) -> DbRow {
        DbRow {
            jud_key: self.key.clone(),
            url: self.url.clone(),
            court: self.citation.court.clone(),
            year: self.citation.year.clone(),
            zi: self.citation.docket_word.clone(),
            number: self.citation.docket_number.clone(),
            case_type: self.citation.case_type.as_str().to_string(),
            judgment_type: self.citation.judgment_type.as_str().to_string(),
            created_at: self.fetched_at.clone(),
        }
    }

    pub fn section(&self, title: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.body.as_str())
    }
}

pub fn assemble(
    url: &str,
    fetched_at: &DateTime<FixedOffset>,
    page: DetailPage,
    citation: Citation,
    sections: Vec<Section>,
    parties: PartyRecord,
) -> JudgmentRecord {
    JudgmentRecord {
        key: citation.key(),
        url: url.to_string(),
        fetched_at: format_timestamp(fetched_at),
        title: page.title,
        date: page.date,
        cause: page.cause,
        citation,
        sections,
        parties,
        body_text: page.body_text,
    }
}
