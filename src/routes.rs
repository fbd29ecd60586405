use crate::error::AppError;
use crate::models::{ActivityEvent, ActivityEventView, AllActivityData, DailyActivityCount, FirstTouchpoint, Person, PersonSummary};
use crate::pagination::{Page, PageRequest};
use crate::repository::EventFilter;
use crate::service::{ActivityQueryService, PageLocation};
use axum::{
    extract::{rejection::QueryRejection, OriginalUri, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub service: ActivityQueryService,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(api_index))
        .route("/activities/", get(list_activities))
        .route("/persons/", get(list_persons))
        .route("/activities/daily-counts/", get(daily_activity_counts))
        .route("/activities/first-touchpoints/", get(first_touchpoints))
        .route("/activities/all-data/", get(all_activity_data))
        .route("/random_activity_events/", get(random_activity_events))
        .route("/random_persons/", get(random_persons));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize, Default)]
pub struct ActivityListParams {
    pub customer_org_id: Option<String>,
    pub account_id: Option<String>,
    pub direction: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PersonListParams {
    pub customer_org_id: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ScopeParams {
    pub customer_org_id: Option<String>,
    pub account_id: Option<String>,
}

type QueryResult<T> = Result<Query<T>, QueryRejection>;

async fn root() -> &'static str {
    "Activity Timeline API v0.1.0"
}

async fn api_index() -> &'static str {
    "Hello, world! This is the API root."
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Paginated events, newest first, with person details merged in
async fn list_activities(
    state: State<AppState>,
    OriginalUri(uri): OriginalUri,
    query: QueryResult<ActivityListParams>,
) -> Result<Json<Page<ActivityEventView>>, AppError> {
    let Query(params) = query?;
    let filter = EventFilter {
        customer_org_id: non_empty(params.customer_org_id),
        account_id: non_empty(params.account_id),
        direction: non_empty(params.direction),
        start_us: parse_bound("start_date", params.start_date, Bound::Start)?,
        end_us: parse_bound("end_date", params.end_date, Bound::End)?,
    };
    let request = page_request(&state.service, params.page, params.page_size)?;
    let location = PageLocation::from_uri(&uri);

    let service = state.service.clone();
    let page = blocking(move || service.list_activities(&filter, request, &location)).await?;
    Ok(Json(page))
}

async fn list_persons(
    state: State<AppState>,
    OriginalUri(uri): OriginalUri,
    query: QueryResult<PersonListParams>,
) -> Result<Json<Page<PersonSummary>>, AppError> {
    let Query(params) = query?;
    let customer_org_id = non_empty(params.customer_org_id);
    let request = page_request(&state.service, params.page, params.page_size)?;
    let location = PageLocation::from_uri(&uri);

    let service = state.service.clone();
    let page = blocking(move || {
        service.list_persons(customer_org_id.as_deref(), request, &location)
    })
    .await?;
    Ok(Json(page))
}

/// Inbound events per day, for the minimap line chart
async fn daily_activity_counts(
    state: State<AppState>,
    query: QueryResult<ScopeParams>,
) -> Result<Json<Vec<DailyActivityCount>>, AppError> {
    let Query(params) = query?;
    let service = state.service.clone();
    let counts = blocking(move || {
        Ok(service.daily_counts(non_empty(params.customer_org_id), non_empty(params.account_id))?)
    })
    .await?;
    Ok(Json(counts))
}

/// First touchpoint per person, for the minimap markers
async fn first_touchpoints(
    state: State<AppState>,
    query: QueryResult<ScopeParams>,
) -> Result<Json<Vec<FirstTouchpoint>>, AppError> {
    let Query(params) = query?;
    let service = state.service.clone();
    let touches = blocking(move || {
        Ok(service.first_touchpoints(non_empty(params.customer_org_id), non_empty(params.account_id))?)
    })
    .await?;
    Ok(Json(touches))
}

async fn all_activity_data(
    state: State<AppState>,
    query: QueryResult<ScopeParams>,
) -> Result<Json<AllActivityData>, AppError> {
    let Query(params) = query?;
    let service = state.service.clone();
    let data = blocking(move || {
        Ok(service.all_activity_data(non_empty(params.customer_org_id), non_empty(params.account_id))?)
    })
    .await?;
    Ok(Json(data))
}

// Legacy endpoints

async fn random_activity_events(
    state: State<AppState>,
    query: QueryResult<ScopeParams>,
) -> Result<Json<Vec<ActivityEvent>>, AppError> {
    let Query(params) = query?;
    let (Some(customer_org_id), Some(account_id)) =
        (non_empty(params.customer_org_id), non_empty(params.account_id))
    else {
        return Err(AppError::MissingParameter(
            "Both 'customer_org_id' and 'account_id' query parameters are required.".to_string(),
        ));
    };

    let service = state.service.clone();
    let events = blocking(move || Ok(service.random_events(&customer_org_id, &account_id)?)).await?;
    Ok(Json(events))
}

async fn random_persons(
    state: State<AppState>,
    query: QueryResult<ScopeParams>,
) -> Result<Json<Vec<Person>>, AppError> {
    let Query(params) = query?;
    let Some(customer_org_id) = non_empty(params.customer_org_id) else {
        return Err(AppError::MissingParameter(
            "'customer_org_id' query parameter is required.".to_string(),
        ));
    };

    let service = state.service.clone();
    let persons = blocking(move || Ok(service.random_persons(&customer_org_id)?)).await?;
    Ok(Json(persons))
}

// Helper functions

/// Run SQLite work off the async worker threads
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// A non-numeric `page` is an invalid page; a non-numeric `page_size` falls back to the default
fn page_request(
    service: &ActivityQueryService,
    page: Option<String>,
    page_size: Option<String>,
) -> Result<PageRequest, AppError> {
    let page = match non_empty(page) {
        Some(raw) => Some(raw.parse::<u64>().map_err(|_| AppError::InvalidPage)?),
        None => None,
    };
    let page_size = non_empty(page_size).and_then(|raw| raw.parse::<u64>().ok());
    Ok(service.page_request(page, page_size))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

/// `YYYY-MM-DD` covers the whole UTC day; an RFC 3339 value is an exact instant.
/// Bounds are unix microseconds, matching the stored `timestamp_us` column.
fn parse_bound(name: &str, value: Option<String>, bound: Bound) -> Result<Option<i64>, AppError> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };

    if let Ok(instant) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(instant.timestamp_micros()));
    }

    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
        AppError::InvalidParameter(format!(
            "'{}' must be a date (YYYY-MM-DD) or an RFC 3339 date-time.",
            name
        ))
    })?;

    let micros = match bound {
        Bound::Start => date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_micros()),
        Bound::End => date
            .checked_add_days(Days::new(1))
            .and_then(|next| next.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_micros() - 1),
    };
    micros
        .map(Some)
        .ok_or_else(|| AppError::InvalidParameter(format!("'{}' is out of range.", name)))
}
