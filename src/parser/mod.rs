pub mod citation;
pub mod html;
pub mod lines;
pub mod parties;
pub mod record;
pub mod sections;

use std::path::Path;

use chrono::{DateTime, FixedOffset};

use crate::error::{ExtractionFailure, FailureReason};
use crate::settings::Settings;
use crate::util::canonical_url;
use citation::Citation;
use parties::PartyRoleExtractor;
use record::JudgmentRecord;
use sections::SectionDecomposer;

/// Detail HTML → page fields → sections + parties + citation → record.
#[derive(Debug, Clone)]
pub struct DocumentParser {
    sections: SectionDecomposer,
    parties: PartyRoleExtractor,
}

impl DocumentParser {
    pub fn new(settings: &Settings) -> Result<Self, regex::Error> {
        Ok(DocumentParser {
            sections: SectionDecomposer::new(&settings.sections)?,
            parties: PartyRoleExtractor::new(&settings.parties)?,
        })
    }

    pub fn sections(&self) -> &SectionDecomposer {
        &self.sections
    }

    /// Reads a saved detail page and processes it under `url`.
    pub fn process_file(
        &self,
        path: &Path,
        url: &str,
        fetched_at: &DateTime<FixedOffset>,
    ) -> Result<JudgmentRecord, ExtractionFailure> {
        match std::fs::read_to_string(path) {
            Ok(html) => self.process(&html, url, fetched_at),
            Err(e) => Err(ExtractionFailure::new(
                FailureReason::Unreadable,
                &canonical_url(url),
                format!("{}: {}", path.display(), e),
            )),
        }
    }

    pub fn process(
        &self,
        html: &str,
        url: &str,
        fetched_at: &DateTime<FixedOffset>,
    ) -> Result<JudgmentRecord, ExtractionFailure> {
        let url = canonical_url(url);
        if html.trim().is_empty() {
            return Err(ExtractionFailure::new(
                FailureReason::EmptyDocument,
                &url,
                "detail page is empty",
            ));
        }

        let page = html::read_detail(html);
        if page.body_text.trim().is_empty() && page.paragraphs.is_empty() {
            return Err(ExtractionFailure::new(
                FailureReason::MissingBody,
                &url,
                "no judgment text found",
            ));
        }

        let sections = self.sections.decompose(&page.body_text);
        let parties = self.parties.extract(&page.paragraphs);
        let citation = Citation::parse(&page.title);
        Ok(record::assemble(&url, fetched_at, page, citation, sections, parties))
    }
}

// ── Tests ──
