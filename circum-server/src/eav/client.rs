//! Upstream planner HTTP client.
//!
//! Both endpoints take a form-encoded POST. Each call is a single attempt:
//! a non-success status is returned with its body for diagnostics, and a
//! body that cannot be parsed is logged and reported as a parse failure.

use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::ClockTime;

use super::board::{BoardEntry, BoardKind, parse_board};
use super::convert::{Itinerary, convert_solutions, format_upstream_date, parse_upstream_date};
use super::error::EavError;
use super::types::SolutionsEnvelope;

/// Default path of the solutions endpoint.
const DEFAULT_SOLUTIONS_PATH: &str = "/orari/soluzioni";

/// Default path of the live board endpoint.
const DEFAULT_BOARD_PATH: &str = "/orari/tabellone";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How much of an unparseable body goes into the log.
const LOGGED_BODY_CHARS: usize = 500;

/// Form field names.
mod field {
    pub const ORIGIN: &str = "origine";
    pub const DESTINATION: &str = "destinazione";
    pub const DATE: &str = "data";
    pub const TIME: &str = "ora";
    pub const STATION: &str = "stazione";
    pub const BOARD_TYPE: &str = "tipo";
}

/// Configuration for the upstream client.
#[derive(Debug, Clone)]
pub struct EavConfig {
    /// Scheme and host of the upstream, without a trailing slash
    pub base_url: String,
    pub solutions_path: String,
    pub board_path: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl EavConfig {
    /// Create a new config for the given upstream.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            solutions_path: DEFAULT_SOLUTIONS_PATH.to_string(),
            board_path: DEFAULT_BOARD_PATH.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_solutions_path(mut self, path: impl Into<String>) -> Self {
        self.solutions_path = path.into();
        self
    }

    pub fn with_board_path(mut self, path: impl Into<String>) -> Self {
        self.board_path = path.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// A point-to-point request to the upstream planner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SolutionsRequest {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub time: ClockTime,
}

impl SolutionsRequest {
    /// Validate request parameters; `date` is `DD/MM/YYYY`.
    pub fn parse(origin: &str, destination: &str, date: &str, time: &str) -> Result<Self, EavError> {
        let origin = origin.trim();
        let destination = destination.trim();
        if origin.is_empty() || destination.is_empty() {
            return Err(EavError::InvalidRequest(
                "origin and destination are required".to_string(),
            ));
        }

        let date = parse_upstream_date(date).map_err(|e| EavError::InvalidRequest(e.to_string()))?;
        let time = ClockTime::parse(time.trim()).map_err(|e| EavError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            date,
            time,
        })
    }

    fn form(&self) -> [(&'static str, String); 4] {
        [
            (field::ORIGIN, self.origin.clone()),
            (field::DESTINATION, self.destination.clone()),
            (field::DATE, format_upstream_date(self.date)),
            (field::TIME, self.time.to_string()),
        ]
    }
}

/// Upstream planner client.
#[derive(Debug, Clone)]
pub struct EavClient {
    http: reqwest::Client,
    solutions_url: String,
    board_url: String,
}

impl EavClient {
    /// Create a new client with the given configuration.
    pub fn new(config: EavConfig) -> Result<Self, EavError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            solutions_url: join(&config.base_url, &config.solutions_path),
            board_url: join(&config.base_url, &config.board_path),
        })
    }

    /// Itineraries between two upstream stations, ascending by departure.
    pub async fn solutions(&self, request: &SolutionsRequest) -> Result<Vec<Itinerary>, EavError> {
        let body = self.post_form(&self.solutions_url, &request.form()).await?;

        let envelope: SolutionsEnvelope = serde_json::from_str(&body).map_err(|e| {
            log_unparsed(&self.solutions_url, &e.to_string(), &body);
            EavError::Parse {
                message: e.to_string(),
            }
        })?;

        convert_solutions(envelope)
    }

    /// Live board for an upstream station.
    pub async fn board(&self, station: &str, kind: BoardKind) -> Result<Vec<BoardEntry>, EavError> {
        let form = [
            (field::STATION, station.trim().to_string()),
            (field::BOARD_TYPE, kind.upstream_code().to_string()),
        ];
        let body = self.post_form(&self.board_url, &form).await?;

        parse_board(&body).inspect_err(|e| {
            if let EavError::Parse { message } = e {
                log_unparsed(&self.board_url, message, &body);
            }
        })
    }

    /// Send one form POST and return the body of a successful response.
    async fn post_form(&self, url: &str, form: &[(&'static str, String)]) -> Result<String, EavError> {
        debug!(url, "upstream request");
        let response = self.http.post(url).form(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EavError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn log_unparsed(url: &str, error: &str, body: &str) {
    let excerpt: String = body.chars().take(LOGGED_BODY_CHARS).collect();
    warn!(url, error, body = %excerpt, "could not parse upstream response");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eav::TrainStatus;
    use axum::{Form, Router, http::StatusCode, routing::post};
    use std::collections::HashMap;

    #[test]
    fn config_builder() {
        let config = EavConfig::new("http://localhost:8080/")
            .with_solutions_path("/s")
            .with_board_path("/b")
            .with_timeout(5);

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.solutions_path, "/s");
        assert_eq!(config.board_path, "/b");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn config_defaults() {
        let config = EavConfig::new("http://localhost");

        assert_eq!(config.solutions_path, DEFAULT_SOLUTIONS_PATH);
        assert_eq!(config.board_path, DEFAULT_BOARD_PATH);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn url_join() {
        assert_eq!(join("http://h", "/a"), "http://h/a");
        assert_eq!(join("http://h/", "a"), "http://h/a");
    }

    #[test]
    fn request_parse() {
        let request = SolutionsRequest::parse("1", " 40 ", "10/06/2024", "08:30").unwrap();
        assert_eq!(request.destination, "40");

        let form = request.form();
        assert_eq!(form[2], ("data", "10/06/2024".to_string()));
        assert_eq!(form[3], ("ora", "08:30".to_string()));

        assert!(SolutionsRequest::parse("1", "40", "2024-06-10", "08:30").is_err());
        assert!(SolutionsRequest::parse("1", "40", "10/06/2024", "8:30").is_err());
        assert!(SolutionsRequest::parse("", "40", "10/06/2024", "08:30").is_err());
    }

    /// Serve a fixed response on both endpoints of a local upstream.
    async fn upstream(status: StatusCode, body: &'static str) -> EavClient {
        async fn echo_form(Form(form): Form<HashMap<String, String>>) -> String {
            serde_json::to_string(&form).unwrap_or_default()
        }

        let app = Router::new()
            .route(DEFAULT_SOLUTIONS_PATH, post(move || async move { (status, body) }))
            .route(DEFAULT_BOARD_PATH, post(move || async move { (status, body) }))
            .route("/echo", post(echo_form));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        EavClient::new(EavConfig::new(format!("http://{addr}")).with_timeout(5)).unwrap()
    }

    #[tokio::test]
    async fn solutions_success() {
        let client = upstream(
            StatusCode::OK,
            r#"{"solutions": [
                {"date": "10/06/2024", "segments": [
                    {"departureStation": "A", "arrivalStation": "B", "departureTime": "09:00", "arrivalTime": "09:40"}
                ]},
                {"date": "10/06/2024", "segments": [
                    {"departureStation": "A", "arrivalStation": "C", "departureTime": "08:00", "arrivalTime": "08:20"},
                    {"departureStation": "C", "arrivalStation": "B", "departureTime": "08:30", "arrivalTime": "08:50", "delay": 4}
                ]}
            ]}"#,
        )
        .await;

        let request = SolutionsRequest::parse("1", "2", "10/06/2024", "08:00").unwrap();
        let itineraries = client.solutions(&request).await.unwrap();

        assert_eq!(itineraries.len(), 2);
        assert_eq!(itineraries[0].transfers(), &["C".to_string()]);
        assert_eq!(itineraries[0].delay_minutes(), 4);
        assert!(itineraries[1].transfers().is_empty());
    }

    #[tokio::test]
    async fn upstream_status_surfaced() {
        let client = upstream(StatusCode::SERVICE_UNAVAILABLE, "maintenance").await;

        let request = SolutionsRequest::parse("1", "2", "10/06/2024", "08:00").unwrap();
        let err = client.solutions(&request).await.unwrap_err();

        assert!(matches!(err, EavError::Upstream { status: 503, ref body } if body == "maintenance"));
    }

    #[tokio::test]
    async fn malformed_json_is_parse_error() {
        let client = upstream(StatusCode::OK, "{\"solutions\": [").await;

        let request = SolutionsRequest::parse("1", "2", "10/06/2024", "08:00").unwrap();
        let err = client.solutions(&request).await.unwrap_err();

        assert!(matches!(err, EavError::Parse { .. }));
    }

    #[tokio::test]
    async fn html_board() {
        let client = upstream(
            StatusCode::OK,
            r#"<table><tr><td class="treno">2101</td><td class="stato">Soppresso</td></tr></table>"#,
        )
        .await;

        let entries = client.board("1", BoardKind::Departures).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, TrainStatus::Cancelled);
    }

    #[tokio::test]
    async fn form_fields_sent() {
        let client = upstream(StatusCode::OK, "").await;
        let echo_url = client.solutions_url.replace(DEFAULT_SOLUTIONS_PATH, "/echo");

        let request = SolutionsRequest::parse("1", "2", "10/06/2024", "08:00").unwrap();
        let body = client.post_form(&echo_url, &request.form()).await.unwrap();
        let form: HashMap<String, String> = serde_json::from_str(&body).unwrap();

        assert_eq!(form["origine"], "1");
        assert_eq!(form["destinazione"], "2");
        assert_eq!(form["data"], "10/06/2024");
        assert_eq!(form["ora"], "08:00");
    }
}
