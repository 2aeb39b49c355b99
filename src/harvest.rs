use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ExtractionFailure, FailureReason};
use crate::gateway::{QuerySpec, ResultRow, RetrievalGateway};
use crate::parser::html::is_busy;
use crate::parser::record::JudgmentRecord;
use crate::parser::DocumentParser;
use crate::results::{CountEstimate, QueryOutcome, ResultSetStateMachine};
use crate::settings::{HarvestSettings, Settings};
use crate::util::{canonical_url, now_taipei};

/// Result of one detail page.
#[derive(Debug)]
pub struct HarvestOutcome {
    pub page: usize,
    pub result: Result<JudgmentRecord, ExtractionFailure>,
    /// The page carried a busy or throttling notice.
    pub rate_limited: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestSummary {
    pub outcome: QueryOutcome,
    pub processed: usize,
    pub failed: usize,
    pub rate_limited: usize,
    pub estimate: Option<CountEstimate>,
}

impl HarvestSummary {
    /// Estimated total, never below the detail rows the walk handled.
    pub fn total(&self) -> usize {
        let handled = self.processed + self.failed;
        self.estimate.map_or(handled, |e| e.value.max(handled))
    }
}

/// Drives one query from submission through every listed detail page.
#[derive(Debug, Clone)]
pub struct Harvester {
    parser: DocumentParser,
    results: ResultSetStateMachine,
    settings: HarvestSettings,
}

impl Harvester {
    pub fn new(settings: &Settings) -> Result<Self, regex::Error> {
        Ok(Harvester {
            parser: DocumentParser::new(settings)?,
            results: ResultSetStateMachine::new(&settings.results)?,
            settings: settings.harvest.clone(),
        })
    }

    pub async fn harvest<G, F>(&self, gateway: &mut G, query: &QuerySpec, mut sink: F) -> HarvestSummary
    where
        G: RetrievalGateway,
        F: FnMut(HarvestOutcome),
    {
        let resolution = self.results.resolve_query(gateway, query).await;
        let mut summary = HarvestSummary {
            outcome: resolution.outcome,
            processed: 0,
            failed: 0,
            rate_limited: 0,
            estimate: resolution.estimate,
        };
        let Some(handle) = resolution.handle else {
            return summary;
        };

        self.walk_pages(gateway, &handle, |outcome| {
            match &outcome.result {
                Ok(_) => summary.processed += 1,
                Err(_) => summary.failed += 1,
            }
            if outcome.rate_limited {
                summary.rate_limited += 1;
            }
            sink(outcome);
        })
        .await;

        info!(
            processed = summary.processed,
            failed = summary.failed,
            estimate = summary.total(),
            "query finished"
        );
        summary
    }

    /// Visits pages in order from page 1, stopping at the first page that
    /// cannot be reached or lists no detail links.
    pub async fn walk_pages<G, F>(&self, gateway: &mut G, handle: &G::Handle, mut sink: F)
    where
        G: RetrievalGateway,
        F: FnMut(HarvestOutcome),
    {
        let page_count = match gateway.page_count(handle).await {
            Ok(n) => n.max(1),
            Err(e) => {
                warn!(error = %e, "page count unavailable, walking first page only");
                1
            }
        };
        let last = self.settings.max_pages.map_or(page_count, |m| m.min(page_count));
        let per_page = self.settings.max_details_per_page.unwrap_or(usize::MAX);

        for page in 1..=last {
            if page > 1 {
                match gateway.goto_page(handle, page).await {
                    Ok(true) => info!(page, "moved to next result page"),
                    Ok(false) => {
                        warn!(page, "result page not reachable, stopping");
                        break;
                    }
                    Err(e) => {
                        warn!(page, error = %e, "page navigation failed, stopping");
                        break;
                    }
                }
            }

            let rows = match gateway.list_page(handle, page).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(page, error = %e, "result listing unavailable, stopping");
                    break;
                }
            };
            let links: Vec<&ResultRow> = rows.iter().filter(|r| self.results.is_detail_row(r)).collect();
            if links.is_empty() {
                warn!(page, "no detail links on page, stopping");
                break;
            }
            info!(page, count = links.len(), "detail links listed");

            for (i, row) in links.into_iter().enumerate() {
                if i >= per_page {
                    info!(page, handled = i, "per-page limit reached");
                    break;
                }
                sink(self.harvest_one(gateway, row, page).await);
            }
        }
    }

    async fn harvest_one<G: RetrievalGateway>(&self, gateway: &mut G, row: &ResultRow, page: usize) -> HarvestOutcome {
        let link = row
            .detail_link(&self.results.settings().detail_link_patterns)
            .unwrap_or_default();

        let (result, rate_limited) = match gateway.fetch_detail(row).await {
            Ok(doc) => {
                let busy = is_busy(&doc.html, &self.settings.busy_messages);
                if busy {
                    warn!(url = %doc.final_url, "busy notice on detail page");
                }
                (self.parser.process(&doc.html, &doc.final_url, &now_taipei()), busy)
            }
            Err(e) => (
                Err(ExtractionFailure::new(
                    FailureReason::Gateway,
                    &canonical_url(link),
                    e.to_string(),
                )),
                false,
            ),
        };

        if let Err(failure) = &result {
            warn!(url = %failure.url, reason = %failure.reason, "skipping document: {}", failure.detail);
        }
        HarvestOutcome {
            page,
            result,
            rate_limited,
        }
    }
}

// ── Tests ──
