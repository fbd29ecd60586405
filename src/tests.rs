use crate::config::Config;
use crate::routes::{router, AppState};
use crate::service::ActivityQueryService;
use crate::test_support::seeded_db;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

fn app() -> Router {
    let mut config = Config::default();
    config.defaults.default_org_id = "org_1".to_string();
    config.defaults.default_account_id = "acct_1".to_string();
    let service = ActivityQueryService::new(seeded_db(), &config);
    router(AppState { service })
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_list_activities_filters_and_sorts() {
    let (status, body) = get("/api/activities/?customer_org_id=org_1&account_id=acct_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);

    let ids: Vec<_> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["touchpoint_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["t4", "t3", "t2", "t1"]);
    assert_eq!(body["results"][3]["formatted_date"], "2024-01-01 09:00");
}

#[tokio::test]
async fn test_list_activities_date_range_inclusive() {
    let (status, body) =
        get("/api/activities/?start_date=2024-01-01&end_date=2024-01-02&direction=IN").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_list_activities_enriches_people() {
    let (_, body) = get("/api/activities/?account_id=acct_1&direction=IN&end_date=2024-01-02").await;
    let t3 = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["touchpoint_id"] == "t3")
        .unwrap();

    let details = t3["people_details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["id"], "p2");
    assert_eq!(details[0]["first_name"], "First p2");
    assert_eq!(details[1]["id"], "missing");
    assert!(details[1].get("first_name").is_none());
}

#[tokio::test]
async fn test_list_activities_pagination_links() {
    let (_, body) = get("/api/activities/?page_size=2").await;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["next"], "/api/activities/?page_size=2&page=2");
    assert!(body["previous"].is_null());

    let (status, body) = get("/api/activities/?page_size=2&page=9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Invalid page.");
}

#[tokio::test]
async fn test_list_activities_rejects_bad_date() {
    let (status, body) = get("/api/activities/?start_date=not-a-date").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_list_activities_end_datetime_is_inclusive() {
    let (status, body) = get("/api/activities/?account_id=acct_1&end_date=2024-01-02T11:00:00Z").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"][0]["touchpoint_id"], "t3");
}

#[tokio::test]
async fn test_list_persons_by_org() {
    let (status, body) = get("/api/persons/?customer_org_id=org_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["id"], "p1");
    assert!(body["results"][0].get("customer_org_id").is_none());
}

#[tokio::test]
async fn test_daily_counts_endpoint() {
    let (status, body) = get("/api/activities/daily-counts/?customer_org_id=org_1&account_id=acct_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!([
            {"date": "2024-01-01", "count": 1},
            {"date": "2024-01-02", "count": 1},
            {"date": "2024-01-04", "count": 1},
        ])
    );
}

#[tokio::test]
async fn test_first_touchpoints_endpoint() {
    let (status, body) = get("/api/activities/first-touchpoints/?customer_org_id=org_1&account_id=acct_1").await;
    assert_eq!(status, StatusCode::OK);

    let touches = body.as_array().unwrap();
    assert_eq!(touches.len(), 2);
    assert_eq!(touches[0]["person_id"], "p1");
    assert_eq!(touches[0]["person_name"], "First p1 Last p1");
    assert_eq!(touches[0]["date"], "2024-01-01");
    assert_eq!(touches[1]["person_id"], "p2");
    assert_eq!(touches[1]["timestamp"], "2024-01-01T15:00:00Z");
}

#[tokio::test]
async fn test_all_data_uses_configured_defaults() {
    let (status, body) = get("/api/activities/all-data/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 4);
    assert_eq!(body["activities"].as_array().unwrap().len(), 4);
    assert_eq!(body["daily_counts"].as_array().unwrap().len(), 3);
    assert_eq!(body["first_touchpoints"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_random_events_requires_both_params() {
    let (status, body) = get("/api/random_activity_events/?customer_org_id=org_1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Both 'customer_org_id' and 'account_id' query parameters are required."
    );

    let (status, body) = get("/api/random_activity_events/?customer_org_id=org_1&account_id=acct_1").await;
    assert_eq!(status, StatusCode::OK);
    let events = body.as_array().unwrap();
    assert!(events.len() <= 10);
    assert_eq!(events.len(), 4);
    assert!(events[0].get("customer_org_id").is_some());
    assert!(events[0].get("people").is_some());
}

#[tokio::test]
async fn test_random_persons_requires_org() {
    let (status, body) = get("/api/random_persons/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "'customer_org_id' query parameter is required.");

    let (status, body) = get("/api/random_persons/?customer_org_id=org_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_persons_pagination_links() {
    let (status, body) = get("/api/persons/?page_size=1&page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"][0]["id"], "p2");
    assert_eq!(body["next"], "/api/persons/?page_size=1&page=3");
    assert_eq!(body["previous"], "/api/persons/?page_size=1");

    let (status, body) = get("/api/persons/?page_size=1&page=4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Invalid page.");
}

#[tokio::test]
async fn test_list_persons_page_size_is_clamped() {
    let (status, body) = get("/api/persons/?page_size=1000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
    assert!(body["next"].is_null());
}

#[tokio::test]
async fn test_duplicate_query_parameter_is_json_bad_request() {
    let (status, body) =
        get("/api/activities/daily-counts/?customer_org_id=org_1&customer_org_id=org_2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
