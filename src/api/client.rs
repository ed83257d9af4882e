use super::types::*;
use log::debug;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMELINE_LIMIT: u32 = 30;

/// Failure of a single API request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Server answered with a non-2xx status.
    #[error("{}", http_message(.status, .body))]
    Http {
        status: u16,
        body: Option<ErrorResponse>,
    },
    /// No response was obtained.
    #[error("{0}")]
    Network(String),
    /// 2xx response whose body did not match the declared shape.
    #[error("{message}")]
    Decode { status: u16, message: String },
}

fn http_message(status: &u16, body: &Option<ErrorResponse>) -> String {
    match body {
        Some(b) if !b.message.is_empty() => b.message.clone(),
        _ => format!("HTTP {}", status),
    }
}

impl ApiError {
    /// HTTP status, or 0 when the request never completed.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Http { status, .. } | ApiError::Decode { status, .. } => *status,
            ApiError::Network(_) => 0,
        }
    }

    pub fn body(&self) -> Option<&ErrorResponse> {
        match self {
            ApiError::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

/// Blocking typed client for the log-analysis backend.
#[derive(Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let url = self.url(endpoint);
        debug!("GET {}", url);
        let result = self
            .agent
            .get(&url)
            .set("Content-Type", "application/json")
            .call();
        parse_response(result)
    }

    fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint);
        debug!("POST {}", url);
        let result = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_json(body);
        parse_response(result)
    }

    // ── Projects & sessions ─────────────────────────────────────────────

    pub fn projects(&self) -> Result<ProjectsResponse, ApiError> {
        self.get("/projects")
    }

    pub fn sessions(&self, project_name: Option<&str>) -> Result<SessionsResponse, ApiError> {
        match project_name {
            Some(name) if !name.is_empty() => {
                self.get(&format!("/sessions?project={}", urlencoding::encode(name)))
            }
            _ => self.get("/sessions"),
        }
    }

    pub fn session_detail(
        &self,
        project_name: &str,
        session_id: &str,
    ) -> Result<SessionDetail, ApiError> {
        self.get(&format!(
            "/sessions/{}/{}",
            urlencoding::encode(project_name),
            urlencoding::encode(session_id)
        ))
    }

    pub fn project_stats(&self, project_name: &str) -> Result<ProjectStats, ApiError> {
        self.get(&format!(
            "/projects/{}/stats",
            urlencoding::encode(project_name)
        ))
    }

    pub fn project_timeline(
        &self,
        project_name: &str,
        period: Period,
        limit: u32,
    ) -> Result<TimeSeriesResponse, ApiError> {
        self.get(&format!(
            "/projects/{}/timeline?period={}&limit={}",
            urlencoding::encode(project_name),
            period,
            limit
        ))
    }

    // ── Groups ───────────────────────────────────────────────────────────

    pub fn groups(&self) -> Result<ProjectGroupListResponse, ApiError> {
        self.get("/groups")
    }

    pub fn group(&self, group_id: i64) -> Result<ProjectGroupDetail, ApiError> {
        self.get(&format!("/groups/{}", group_id))
    }

    pub fn group_stats(&self, group_id: i64) -> Result<ProjectGroupStats, ApiError> {
        self.get(&format!("/groups/{}/stats", group_id))
    }

    pub fn group_timeline(
        &self,
        group_id: i64,
        period: Period,
        limit: u32,
    ) -> Result<TimeSeriesResponse, ApiError> {
        self.get(&format!(
            "/groups/{}/timeline?period={}&limit={}",
            group_id, period, limit
        ))
    }

    // ── Totals ───────────────────────────────────────────────────────────

    pub fn total_stats(&self) -> Result<TotalStats, ApiError> {
        self.get("/stats/total")
    }

    pub fn total_timeline(&self, period: Period, limit: u32) -> Result<TimeSeriesResponse, ApiError> {
        self.get(&format!("/stats/timeline?period={}&limit={}", period, limit))
    }

    // ── Drilldown ────────────────────────────────────────────────────────

    pub fn daily_stats(&self, date: &str) -> Result<DailyStatsResponse, ApiError> {
        self.get(&format!("/stats/daily/{}", date))
    }

    pub fn group_daily_stats(
        &self,
        group_id: i64,
        date: &str,
    ) -> Result<GroupDailyStatsResponse, ApiError> {
        self.get(&format!("/groups/{}/daily/{}", group_id, date))
    }

    pub fn project_daily_stats(
        &self,
        project_name: &str,
        date: &str,
    ) -> Result<ProjectDailyStatsResponse, ApiError> {
        self.get(&format!(
            "/projects/{}/daily/{}",
            urlencoding::encode(project_name),
            date
        ))
    }

    // ── Maintenance ──────────────────────────────────────────────────────

    pub fn scan_status(&self) -> Result<ScanStatus, ApiError> {
        self.get("/scan/status")
    }

    pub fn analyze(&self, request: Option<&AnalyzeRequest>) -> Result<AnalyzeResponse, ApiError> {
        let empty = AnalyzeRequest::default();
        self.post("/analyze", request.unwrap_or(&empty))
    }

    pub fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get("/health")
    }
}

fn parse_response<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
) -> Result<T, ApiError> {
    match result {
        Ok(response) => {
            let status = response.status();
            response.into_json::<T>().map_err(|e| ApiError::Decode {
                status,
                message: e.to_string(),
            })
        }
        Err(ureq::Error::Status(status, response)) => {
            let body = response
                .into_json::<ErrorResponse>()
                .unwrap_or_else(|_| ErrorResponse::unknown());
            Err(ApiError::Http {
                status,
                body: Some(body),
            })
        }
        Err(ureq::Error::Transport(transport)) => Err(ApiError::Network(transport.to_string())),
    }
}
