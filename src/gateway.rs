use serde::Serialize;

use crate::error::GatewayError;

/// Search parameters handed to the gateway as-is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuerySpec {
    pub params: Vec<(String, String)>,
}

impl QuerySpec {
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmitStatus {
    Ok,
    NoData,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct Submission<H> {
    pub handle: Option<H>,
    pub status: SubmitStatus,
}

/// One row of a result listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRow {
    pub hrefs: Vec<String>,
}

impl ResultRow {
    pub fn new(hrefs: &[&str]) -> Self {
        ResultRow {
            hrefs: hrefs.iter().map(|h| h.to_string()).collect(),
        }
    }

    /// First href that points at a judgment detail page.
    pub fn detail_link(&self, patterns: &[String]) -> Option<&str> {
        self.hrefs
            .iter()
            .find(|h| patterns.iter().any(|p| !p.is_empty() && h.contains(p.as_str())))
            .map(String::as_str)
    }
}

/// What the results frame shows at one poll point.
#[derive(Debug, Clone, Default)]
pub struct ResultsPage {
    /// Page header text, if a header is rendered.
    pub header: Option<String>,
    /// Rows of the results table; `None` when no table is rendered.
    pub table: Option<Vec<ResultRow>>,
    /// The frame has finished rendering; an absent table now means absent.
    pub settled: bool,
}

#[derive(Debug, Clone)]
pub struct DetailDocument {
    pub html: String,
    pub final_url: String,
}

/// Navigation primitives over a live result set. Page indices start at 1.
#[allow(async_fn_in_trait)]
pub trait RetrievalGateway {
    type Handle;

    async fn submit_query(&mut self, query: &QuerySpec) -> Result<Submission<Self::Handle>, GatewayError>;

    async fn results_snapshot(&mut self, handle: &Self::Handle) -> Result<ResultsPage, GatewayError>;

    async fn list_page(&mut self, handle: &Self::Handle, page: usize) -> Result<Vec<ResultRow>, GatewayError>;

    async fn page_count(&mut self, handle: &Self::Handle) -> Result<usize, GatewayError>;

    async fn goto_page(&mut self, handle: &Self::Handle, page: usize) -> Result<bool, GatewayError>;

    async fn fetch_detail(&mut self, row: &ResultRow) -> Result<DetailDocument, GatewayError>;

    async fn page_text_hint(&mut self, handle: &Self::Handle) -> Result<String, GatewayError>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory gateway shared by the results and harvest tests.

    use std::collections::HashMap;

    use super::*;

    #[derive(Debug, Default)]
    pub struct FakeGateway {
        pub submit_status: Option<SubmitStatus>,
        /// Snapshots returned in order; the last one repeats.
        pub snapshots: Vec<Result<ResultsPage, GatewayError>>,
        pub pages: Vec<Vec<ResultRow>>,
        pub hint: String,
        pub details: HashMap<String, DetailDocument>,
        /// Pages whose navigation reports failure.
        pub broken_pages: Vec<usize>,
        pub current: usize,
        pub snapshot_calls: usize,
        pub visited: Vec<usize>,
        pub fetched: Vec<String>,
    }

    impl FakeGateway {
        pub fn with_pages(pages: Vec<Vec<ResultRow>>) -> Self {
            FakeGateway {
                submit_status: Some(SubmitStatus::Ok),
                pages,
                current: 1,
                ..FakeGateway::default()
            }
        }

        pub fn detail(mut self, url: &str, html: &str) -> Self {
            self.details.insert(
                url.to_string(),
                DetailDocument {
                    html: html.to_string(),
                    final_url: url.to_string(),
                },
            );
            self
        }
    }

    pub fn rows(prefix: &str, n: usize) -> Vec<ResultRow> {
        (1..=n)
            .map(|i| ResultRow {
                hrefs: vec![format!("data.aspx?ty=JD&id={prefix}{i}")],
            })
            .collect()
    }

    impl RetrievalGateway for FakeGateway {
        type Handle = ();

        async fn submit_query(&mut self, _query: &QuerySpec) -> Result<Submission<()>, GatewayError> {
            let status = self.submit_status.unwrap_or(SubmitStatus::Unknown);
            let handle = (status == SubmitStatus::Ok).then_some(());
            Ok(Submission { handle, status })
        }

        async fn results_snapshot(&mut self, _handle: &()) -> Result<ResultsPage, GatewayError> {
            let i = self.snapshot_calls.min(self.snapshots.len().saturating_sub(1));
            self.snapshot_calls += 1;
            match self.snapshots.get(i) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(_)) => Err(GatewayError::FrameUnavailable),
                None => Ok(ResultsPage {
                    table: self.pages.first().cloned(),
                    settled: true,
                    ..ResultsPage::default()
                }),
            }
        }

        async fn list_page(&mut self, _handle: &(), page: usize) -> Result<Vec<ResultRow>, GatewayError> {
            if page != self.current {
                return Err(GatewayError::Other(format!("page {page} is not current")));
            }
            Ok(self.pages.get(page - 1).cloned().unwrap_or_default())
        }

        async fn page_count(&mut self, _handle: &()) -> Result<usize, GatewayError> {
            Ok(self.pages.len().max(1))
        }

        async fn goto_page(&mut self, _handle: &(), page: usize) -> Result<bool, GatewayError> {
            if self.broken_pages.contains(&page) {
                return Err(GatewayError::Navigation(page));
            }
            if page == 0 || page > self.pages.len() {
                return Ok(false);
            }
            self.current = page;
            self.visited.push(page);
            Ok(true)
        }

        async fn fetch_detail(&mut self, row: &ResultRow) -> Result<DetailDocument, GatewayError> {
            let url = row.hrefs.first().cloned().unwrap_or_default();
            self.fetched.push(url.clone());
            self.details
                .get(&url)
                .cloned()
                .ok_or_else(|| GatewayError::Detail(url))
        }

        async fn page_text_hint(&mut self, _handle: &()) -> Result<String, GatewayError> {
            Ok(self.hint.clone())
        }
    }
}
