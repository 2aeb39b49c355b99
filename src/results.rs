use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::gateway::{QuerySpec, ResultRow, ResultsPage, RetrievalGateway, SubmitStatus};
use crate::settings::ResultSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryOutcome {
    HasData,
    NoData,
    /// Window expired unresolved: zero observed, total unknown.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    Hint,
    SinglePage,
    Derived,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountEstimate {
    pub value: usize,
    pub source: EstimateSource,
}

#[derive(Debug, Clone)]
pub struct QueryResolution<H> {
    pub outcome: QueryOutcome,
    pub handle: Option<H>,
    pub estimate: Option<CountEstimate>,
}

/// Decides whether a submitted query produced results and how many.
#[derive(Debug, Clone)]
pub struct ResultSetStateMachine {
    settings: ResultSettings,
    hint_re: Regex,
}

impl ResultSetStateMachine {
    pub fn new(settings: &ResultSettings) -> Result<Self, regex::Error> {
        Ok(ResultSetStateMachine {
            hint_re: Regex::new(&settings.count_hint_pattern)?,
            settings: settings.clone(),
        })
    }

    pub fn settings(&self) -> &ResultSettings {
        &self.settings
    }

    /// `None` while the page is still pending.
    pub fn classify(&self, page: &ResultsPage) -> Option<QueryOutcome> {
        let indicator = self.settings.no_data_indicator.as_str();
        let said_no_data = page
            .header
            .as_deref()
            .map(|h| h.replace('\u{a0}', " "))
            .is_some_and(|h| !indicator.is_empty() && h.contains(indicator));
        if said_no_data {
            return Some(QueryOutcome::NoData);
        }

        let has_link = page
            .table
            .as_deref()
            .is_some_and(|rows| rows.iter().any(|r| self.is_detail_row(r)));
        if has_link {
            Some(QueryOutcome::HasData)
        } else if page.settled {
            Some(QueryOutcome::NoData)
        } else {
            None
        }
    }

    pub fn is_detail_row(&self, row: &ResultRow) -> bool {
        row.detail_link(&self.settings.detail_link_patterns).is_some()
    }

    /// Polls the results frame at a fixed interval until it resolves or the
    /// window runs out.
    pub async fn wait_for_outcome<G: RetrievalGateway>(
        &self,
        gateway: &mut G,
        handle: &G::Handle,
    ) -> QueryOutcome {
        for attempt in 0..self.settings.poll_count {
            match gateway.results_snapshot(handle).await {
                Ok(page) => {
                    if let Some(outcome) = self.classify(&page) {
                        debug!(?outcome, attempt, "results resolved");
                        return outcome;
                    }
                }
                Err(e) => debug!(attempt, error = %e, "results snapshot failed, polling on"),
            }
            tokio::time::sleep(self.settings.poll_interval()).await;
        }

        warn!(
            outcome = ?QueryOutcome::Unknown,
            polls = self.settings.poll_count,
            "results did not resolve within the polling window"
        );
        QueryOutcome::Unknown
    }

    /// `共 1,234 筆` → 1234.
    pub fn parse_count_hint(&self, text: &str) -> Option<usize> {
        let caps = self.hint_re.captures(text)?;
        let digits: String = caps.get(1)?.as_str().chars().filter(|c| *c != ',').collect();
        digits.parse().ok()
    }

    /// Best-effort total. Never fails and never reports fewer rows than the
    /// pages it visited listed.
    pub async fn estimate_total<G: RetrievalGateway>(
        &self,
        gateway: &mut G,
        handle: &G::Handle,
    ) -> CountEstimate {
        let observed = self.detail_rows(gateway, handle, 1).await.unwrap_or(0);

        if let Ok(text) = gateway.page_text_hint(handle).await {
            if let Some(n) = self.parse_count_hint(&text) {
                info!(estimate = n, "count hint found");
                return CountEstimate {
                    value: n.max(observed),
                    source: EstimateSource::Hint,
                };
            }
        }

        let mut last_rows = 0;
        match self.derive_total(gateway, handle, observed, &mut last_rows).await {
            Ok(estimate) => {
                info!(estimate = estimate.value, source = ?estimate.source, "count estimated");
                estimate
            }
            Err(e) => {
                let value = observed + last_rows;
                warn!(estimate = value, error = %e, "count estimate degraded to rows already seen");
                // Leave the listing on page 1 if at all possible.
                let _ = gateway.goto_page(handle, 1).await;
                CountEstimate {
                    value,
                    source: EstimateSource::Degraded,
                }
            }
        }
    }

    /// `last_rows` keeps the last page's count even when a later step fails.
    async fn derive_total<G: RetrievalGateway>(
        &self,
        gateway: &mut G,
        handle: &G::Handle,
        observed: usize,
        last_rows: &mut usize,
    ) -> Result<CountEstimate, GatewayError> {
        let total_pages = gateway.page_count(handle).await?;
        if total_pages <= 1 {
            return Ok(CountEstimate {
                value: observed,
                source: EstimateSource::SinglePage,
            });
        }

        navigate(gateway, handle, total_pages).await?;
        *last_rows = self.detail_rows(gateway, handle, total_pages).await?;

        navigate(gateway, handle, 1).await?;
        let first_rows = self.detail_rows(gateway, handle, 1).await?;
        let page_size = match first_rows {
            0 => self.settings.default_page_size,
            n => n,
        };

        let value = (total_pages - 1) * page_size + *last_rows;
        Ok(CountEstimate {
            value: value.max(observed.max(first_rows) + *last_rows),
            source: EstimateSource::Derived,
        })
    }

    async fn detail_rows<G: RetrievalGateway>(
        &self,
        gateway: &mut G,
        handle: &G::Handle,
        page: usize,
    ) -> Result<usize, GatewayError> {
        let rows = gateway.list_page(handle, page).await?;
        Ok(rows.iter().filter(|r| self.is_detail_row(r)).count())
    }

    /// Submits the query and settles its outcome. Submission failures count
    /// as an unresolved query, not an error.
    pub async fn resolve_query<G: RetrievalGateway>(
        &self,
        gateway: &mut G,
        query: &QuerySpec,
    ) -> QueryResolution<G::Handle> {
        let submission = match gateway.submit_query(query).await {
            Ok(s) => s,
            Err(e) => {
                warn!(outcome = ?QueryOutcome::Unknown, error = %e, "query submission failed");
                return unresolved(QueryOutcome::Unknown);
            }
        };

        let handle = match (submission.status, submission.handle) {
            (SubmitStatus::Ok, Some(handle)) => handle,
            (SubmitStatus::NoData, _) => {
                info!(outcome = ?QueryOutcome::NoData, "query returned no data");
                return unresolved(QueryOutcome::NoData);
            }
            _ => {
                warn!(outcome = ?QueryOutcome::Unknown, "results frame never appeared");
                return unresolved(QueryOutcome::Unknown);
            }
        };

        let outcome = self.wait_for_outcome(gateway, &handle).await;
        match outcome {
            QueryOutcome::HasData => {
                let estimate = self.estimate_total(gateway, &handle).await;
                QueryResolution {
                    outcome,
                    handle: Some(handle),
                    estimate: Some(estimate),
                }
            }
            QueryOutcome::NoData => {
                info!(outcome = ?outcome, "no results listed");
                unresolved(outcome)
            }
            QueryOutcome::Unknown => unresolved(outcome),
        }
    }
}

fn unresolved<H>(outcome: QueryOutcome) -> QueryResolution<H> {
    QueryResolution {
        outcome,
        handle: None,
        estimate: None,
    }
}

async fn navigate<G: RetrievalGateway>(
    gateway: &mut G,
    handle: &G::Handle,
    page: usize,
) -> Result<(), GatewayError> {
    if gateway.goto_page(handle, page).await? {
        Ok(())
    } else {
        Err(GatewayError::Navigation(page))
    }
}

// ── Tests ──
