//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Local;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::domain::ClockTime;
use crate::eav::{BoardKind, EavError, SolutionsRequest, format_upstream_date};
use crate::planner::{Planner, QueryError, RawQuery, ScheduleQuery};

use super::dto::*;
use super::state::AppState;

/// Largest station search page.
const MAX_STATION_LIMIT: usize = 50;

/// Shown instead of the details of an unparseable upstream body.
const UNPARSEABLE_UPSTREAM: &str = "upstream returned a response that could not be understood";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations/search", get(search_stations))
        .route("/api/trains/search", get(search_trains))
        .route("/api/trains/departures", get(next_departures))
        .route("/api/eav/solutions", get(eav_solutions))
        .route("/api/eav/board", get(eav_board))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Search stations by name or code.
async fn search_stations(
    State(state): State<AppState>,
    Query(req): Query<StationSearchRequest>,
) -> Result<Json<StationSearchResponse>, AppError> {
    let limit = req
        .limit
        .unwrap_or(state.config.max_station_results)
        .min(MAX_STATION_LIMIT);

    let planner = Planner::new(state.store.as_ref(), &state.config);
    let stations = planner.stations(&req.q, Some(limit))?;

    Ok(Json(StationSearchResponse { stations }))
}

/// Point-to-point search over the local schedule.
async fn search_trains(
    State(state): State<AppState>,
    Query(params): Query<TrainSearchParams>,
) -> Result<Json<TrainSearchResponse>, AppError> {
    let query = ScheduleQuery::parse(&RawQuery::from(params), true)?;

    let planner = Planner::new(state.store.as_ref(), &state.config);
    let outcome = planner.search(&query, Local::now().date_naive())?;

    Ok(Json(outcome.into()))
}

/// Next departures from a station, optionally express only.
///
/// With neither date nor time given, only trains leaving from now on are
/// listed.
async fn next_departures(
    State(state): State<AppState>,
    Query(params): Query<TrainSearchParams>,
) -> Result<Json<TrainSearchResponse>, AppError> {
    let raw = RawQuery {
        to: None,
        ..RawQuery::from(params)
    };
    let mut query = ScheduleQuery::parse(&raw, false)?;

    let now = Local::now();
    if query.date.is_none() && query.time.is_none() {
        query.time = Some(ClockTime::from_naive(now.time()));
    }

    let planner = Planner::new(state.store.as_ref(), &state.config);
    let outcome = planner.search(&query, now.date_naive())?;

    Ok(Json(outcome.into()))
}

/// Point-to-point solutions from the upstream planner.
async fn eav_solutions(
    State(state): State<AppState>,
    Query(params): Query<SolutionsParams>,
) -> Result<Json<SolutionsResponse>, AppError> {
    let origin = state
        .registry
        .get(required(&params.origin, "origin")?)?
        .clone();
    let destination = state
        .registry
        .get(required(&params.destination, "destination")?)?
        .clone();

    let now = Local::now().naive_local();
    let date = present(&params.date)
        .map(str::to_string)
        .unwrap_or_else(|| format_upstream_date(now.date()));
    let time = present(&params.time)
        .map(str::to_string)
        .unwrap_or_else(|| ClockTime::from_naive(now.time()).to_string());

    let request = SolutionsRequest::parse(&origin.id, &destination.id, &date, &time)?;
    let itineraries = state.eav()?.solutions(&request).await?;

    Ok(Json(SolutionsResponse {
        origin,
        destination,
        solutions: itineraries.iter().map(ItineraryResult::from).collect(),
    }))
}

/// Live arrivals or departures board from the upstream.
async fn eav_board(
    State(state): State<AppState>,
    Query(params): Query<BoardParams>,
) -> Result<Json<BoardResponse>, AppError> {
    let station = state
        .registry
        .get(required(&params.station, "station")?)?
        .clone();
    let kind = present(&params.kind)
        .map(BoardKind::parse)
        .transpose()?
        .unwrap_or(BoardKind::Departures);

    let entries = state
        .eav()?
        .board(&station.id, kind, Local::now().naive_local())
        .await?;

    Ok(Json(BoardResponse {
        station,
        kind,
        trains: entries.iter().map(BoardEntryResult::from).collect(),
    }))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    present(value).ok_or_else(|| AppError::BadRequest {
        message: format!("missing required parameter: {name}"),
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    BadGateway { message: String },
    ServiceUnavailable { message: String },
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<EavError> for AppError {
    fn from(e: EavError) -> Self {
        let message = e.to_string();
        if e.is_client_error() {
            return AppError::BadRequest { message };
        }

        match e {
            EavError::NotConfigured(_) => AppError::ServiceUnavailable { message },
            // The body has already been logged by the client
            EavError::Parse { .. } => AppError::BadGateway {
                message: UNPARSEABLE_UPSTREAM.to_string(),
            },
            _ => AppError::BadGateway { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::ServiceUnavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, CachedEavClient};
    use crate::domain::{
        Category, Direction, OperatingDays, Station, StationId, StopId, Train, TrainId, TrainStop,
    };
    use crate::eav::{EavClient, EavConfig, StationRegistry};
    use crate::planner::SearchConfig;
    use crate::store::{MemoryStore, Schedule};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use axum::routing::post;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn time(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn train(id: u32, number: &str, dep: &str, express: bool) -> Train {
        Train {
            id: TrainId(id),
            train_number: Some(number.to_string()),
            direction: Direction::TowardB,
            departure_time: time(dep),
            operating_days: OperatingDays::Daily,
            is_campania_express: express,
            category: if express {
                Category::ExpressTourist
            } else {
                Category::Standard
            },
            start_station_id: StationId(1),
            end_station_id: StationId(4),
        }
    }

    fn stop(id: u32, train: u32, station: u32, order: u32, arr: Option<&str>, dep: Option<&str>) -> TrainStop {
        TrainStop {
            id: StopId(id),
            train_id: TrainId(train),
            station_id: StationId(station),
            arrival_time: arr.map(time),
            departure_time: dep.map(time),
            stop_order: order,
        }
    }

    fn schedule() -> Schedule {
        let stations = vec![
            Station::new(1, "Napoli Porta Nolana", "NPN").unwrap(),
            Station::new(2, "Ercolano Scavi", "ERC").unwrap(),
            Station::new(3, "Pompei Scavi", "PSC").unwrap(),
            Station::new(4, "Sorrento", "SOR").unwrap(),
        ];
        let trains = vec![train(1, "2101", "08:00", false), train(2, "2103", "09:00", true)];
        let stops = vec![
            stop(1, 1, 1, 1, None, Some("08:00")),
            stop(2, 1, 2, 2, Some("08:20"), Some("08:21")),
            stop(3, 1, 3, 3, Some("08:40"), Some("08:41")),
            stop(4, 1, 4, 4, Some("09:05"), None),
            // Express: no arrival time recorded at Sorrento
            stop(5, 2, 1, 1, None, Some("09:00")),
            stop(6, 2, 4, 2, None, None),
        ];
        Schedule::new(stations, trains, stops).unwrap()
    }

    fn registry() -> StationRegistry {
        StationRegistry::from_json_str(
            r#"[{"id": "1", "name": "Napoli Porta Nolana"}, {"id": "40", "name": "Sorrento"}]"#,
        )
        .unwrap()
    }

    fn app(eav: Option<CachedEavClient>) -> Router {
        let store = Arc::new(MemoryStore::new(schedule()));
        create_router(AppState::new(store, SearchConfig::default(), eav, registry()))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// A local upstream serving fixed responses on `/s` and `/b`.
    async fn upstream(solutions: (StatusCode, &'static str), board: (StatusCode, &'static str)) -> CachedEavClient {
        let upstream = Router::new()
            .route("/s", post(move || async move { solutions }))
            .route("/b", post(move || async move { board }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.unwrap();
        });

        let config = EavConfig::new(format!("http://{addr}"))
            .with_solutions_path("/s")
            .with_board_path("/b")
            .with_timeout(5);
        CachedEavClient::new(EavClient::new(config).unwrap(), &CacheConfig::default())
    }

    #[tokio::test]
    async fn health_check() {
        let response = app(None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn station_search() {
        let (status, json) = get(app(None), "/api/stations/search?q=scavi").await;
        assert_eq!(status, StatusCode::OK);

        let names: Vec<&str> = json["stations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Pompei Scavi"));

        let (_, json) = get(app(None), "/api/stations/search?q=scavi&limit=1").await;
        assert_eq!(json["stations"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn point_to_point_search() {
        let (status, json) = get(app(None), "/api/trains/search?from=napoli&to=sorrento&date=2024-06-10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalResults"], 2);
        assert!(json.get("message").is_none());

        let trains = json["trains"].as_array().unwrap();
        assert_eq!(trains[0]["trainNumber"], "2101");
        assert_eq!(trains[0]["departureTime"], "08:00");
        assert_eq!(trains[0]["arrivalTime"], "09:05");
        assert_eq!(trains[0]["durationMinutes"], 65);
        assert_eq!(trains[0]["stops"].as_array().unwrap().len(), 4);

        assert_eq!(trains[1]["trainNumber"], "2103");
        assert_eq!(trains[1]["arrivalTime"], "N/A");
    }

    #[tokio::test]
    async fn express_only_search() {
        let (_, json) = get(
            app(None),
            "/api/trains/search?from=napoli&to=sorrento&isCampaniaExpress=true",
        )
        .await;

        let trains = json["trains"].as_array().unwrap();
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0]["isCampaniaExpress"], true);
    }

    #[tokio::test]
    async fn unmatched_station_is_empty_with_message() {
        let (status, json) = get(app(None), "/api/trains/search?from=napoli&to=salerno").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalResults"], 0);
        assert_eq!(json["message"], "No station matches 'salerno'");
        assert_eq!(json["fromStations"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn validation_errors_are_bad_request() {
        let (status, json) = get(app(None), "/api/trains/search?from=napoli").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "missing required parameter: to");

        let (status, _) = get(app(None), "/api/trains/search?from=napoli&to=sorrento&time=8:00").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(app(None), "/api/trains/search?from=napoli&to=sorrento&date=10/06/2024").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(app(None), "/api/trains/departures?from=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn departures_from_intermediate_station() {
        let (status, json) = get(
            app(None),
            "/api/trains/departures?from=ercolano&date=2024-06-10&time=08:00",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let trains = json["trains"].as_array().unwrap();
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0]["departureTime"], "08:21");
        assert_eq!(trains[0]["originates"], false);
        assert!(trains[0].get("arrivalTime").is_none());
    }

    #[tokio::test]
    async fn departures_time_floor() {
        let (_, json) = get(
            app(None),
            "/api/trains/departures?from=napoli&date=2024-06-10&time=08:30",
        )
        .await;

        let trains = json["trains"].as_array().unwrap();
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0]["trainNumber"], "2103");
    }

    #[tokio::test]
    async fn remote_unknown_station() {
        let (status, json) = get(app(None), "/api/eav/solutions?origin=1&destination=999").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("999"));

        let (status, _) = get(app(None), "/api/eav/board").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn remote_not_configured() {
        let (status, _) = get(app(None), "/api/eav/solutions?origin=1&destination=40").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = get(app(None), "/api/eav/board?station=1&type=platforms").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn remote_solutions() {
        let eav = upstream(
            (
                StatusCode::OK,
                r#"{"solutions": [{"date": "10/06/2024", "segments": [
                    {"trainNumber": "2101", "departureStation": "Napoli Porta Nolana", "arrivalStation": "Sorrento",
                     "departureTime": "08:00", "arrivalTime": "09:05", "delay": 3}
                ]}]}"#,
            ),
            (StatusCode::OK, ""),
        )
        .await;

        let (status, json) = get(
            app(Some(eav)),
            "/api/eav/solutions?origin=1&destination=40&date=10/06/2024&time=07:30",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["destination"]["name"], "Sorrento");

        let solution = &json["solutions"][0];
        assert_eq!(solution["direct"], true);
        assert_eq!(solution["durationMinutes"], 65);
        assert_eq!(solution["delayMinutes"], 3);
        assert_eq!(solution["segments"][0]["trainNumber"], "2101");
    }

    #[tokio::test]
    async fn remote_http_failure_is_bad_gateway() {
        let eav = upstream(
            (StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            (StatusCode::OK, ""),
        )
        .await;

        let (status, json) = get(
            app(Some(eav)),
            "/api/eav/solutions?origin=1&destination=40&date=10/06/2024&time=07:30",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let error = json["error"].as_str().unwrap();
        assert!(error.contains("500"));
        assert!(error.contains("boom"));
    }

    #[tokio::test]
    async fn remote_parse_failure_hides_body() {
        let eav = upstream(
            (StatusCode::OK, ""),
            (StatusCode::OK, "secret maintenance page"),
        )
        .await;

        let (status, json) = get(app(Some(eav)), "/api/eav/board?station=1").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"], UNPARSEABLE_UPSTREAM);
    }

    #[tokio::test]
    async fn remote_board() {
        let eav = upstream(
            (StatusCode::OK, ""),
            (
                StatusCode::OK,
                r#"<table>
                    <tr><th>Treno</th></tr>
                    <tr><td class="treno">2101</td><td class="destinazione">Sorrento</td>
                        <td class="orario">08:00</td><td class="stato">Soppresso</td></tr>
                </table>"#,
            ),
        )
        .await;

        let (status, json) = get(app(Some(eav)), "/api/eav/board?station=1&type=departures").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["type"], "departures");
        assert_eq!(json["station"]["id"], "1");

        let trains = json["trains"].as_array().unwrap();
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0]["trainNumber"], "2101");
        assert_eq!(trains[0]["status"], "CANCELLED");
        assert_eq!(trains[0]["scheduledTime"], "08:00");
    }
}
