use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::geo::{self, Coordinate, Ranked};
use crate::school::{NewSchool, School, MAX_ADDRESS_LEN, MAX_NAME_LEN};
use crate::storage::StorageKind;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    success: bool,
    message: String,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            success: false,
            message: self.1,
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── GET / ───────────────────────────────────────────────────────

pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "School Atlas API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "addSchool": "POST /addSchool",
            "listSchools": "GET /listSchools?latitude=..&longitude=.."
        }
    }))
}

// ─── POST /addSchool ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddSchoolBody {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Serialize)]
pub struct AddSchoolResponse {
    pub success: bool,
    pub message: String,
    pub data: School,
    pub storage: StorageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub async fn add_school(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddSchoolBody>,
) -> Result<Response, ApiError> {
    let start = Instant::now();

    let school = validate_school(body)?;

    let served = state.backend.insert(&school).await.map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to store school: {}", e),
        )
    })?;

    eprintln!(
        "[{}] POST /addSchool '{}' -> {} id={} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        served.value.name,
        served.storage,
        served.value.id,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    let message = match served.storage {
        StorageKind::Sqlite => "School added successfully to database",
        StorageKind::Memory => "School added successfully to in-memory storage",
    };
    let resp = AddSchoolResponse {
        success: true,
        message: message.to_string(),
        storage: served.storage,
        note: degradation_note(served.degraded),
        data: served.value,
    };
    Ok((StatusCode::CREATED, Json(resp)).into_response())
}

fn validate_school(body: AddSchoolBody) -> Result<NewSchool, ApiError> {
    let name = body.name.as_deref().map(str::trim).unwrap_or("");
    if name.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "'name' is required and must be non-empty",
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("'name' must be at most {} characters", MAX_NAME_LEN),
        ));
    }

    let address = body.address.as_deref().map(str::trim).unwrap_or("");
    if address.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "'address' is required and must be non-empty",
        ));
    }
    if address.len() > MAX_ADDRESS_LEN {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("'address' must be at most {} characters", MAX_ADDRESS_LEN),
        ));
    }

    let latitude = body.latitude.ok_or_else(|| {
        api_error(StatusCode::BAD_REQUEST, "'latitude' is required and must be a number")
    })?;
    let longitude = body.longitude.ok_or_else(|| {
        api_error(StatusCode::BAD_REQUEST, "'longitude' is required and must be a number")
    })?;
    validate_coordinate(latitude, longitude)?;

    Ok(NewSchool {
        name: name.to_string(),
        address: address.to_string(),
        latitude,
        longitude,
    })
}

fn validate_coordinate(lat: f64, lon: f64) -> Result<(), ApiError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid 'latitude'. Must be a number in -90..90",
        ));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid 'longitude'. Must be a number in -180..180",
        ));
    }
    Ok(())
}

// ─── GET /listSchools ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListSchoolsQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Serialize)]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize)]
pub struct ListSchoolsResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<Ranked<School>>,
    #[serde(rename = "userLocation")]
    pub user_location: UserLocation,
    pub storage: StorageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub async fn list_schools(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListSchoolsQuery>,
) -> Result<Json<ListSchoolsResponse>, ApiError> {
    let start = Instant::now();

    let latitude = params.latitude.ok_or_else(|| {
        api_error(StatusCode::BAD_REQUEST, "Missing 'latitude' query parameter")
    })?;
    let longitude = params.longitude.ok_or_else(|| {
        api_error(StatusCode::BAD_REQUEST, "Missing 'longitude' query parameter")
    })?;
    validate_coordinate(latitude, longitude)?;
    let reference = Coordinate {
        lat: latitude,
        lon: longitude,
    };

    let served = state.backend.list_all().await.map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to list schools: {}", e),
        )
    })?;

    let ranked = geo::rank(reference, served.value, School::coordinate);

    eprintln!(
        "[{}] GET /listSchools ({:.4}, {:.4}) -> {} schools from {} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        latitude,
        longitude,
        ranked.len(),
        served.storage,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(ListSchoolsResponse {
        success: true,
        message: "Schools retrieved successfully".to_string(),
        data: ranked,
        user_location: UserLocation { latitude, longitude },
        storage: served.storage,
        note: degradation_note(served.degraded),
    }))
}

// ─── Fallback ────────────────────────────────────────────────────

pub async fn not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "Endpoint not found")
}

// ─── Helpers ─────────────────────────────────────────────────────

fn degradation_note(degraded: bool) -> Option<String> {
    degraded.then(|| {
        "Database unavailable. Served from in-memory storage; data added here is lost on restart."
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::storage::Backend;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_school(name: &str, lat: f64, lon: f64) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/addSchool")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "name": name,
                    "address": "1 Main St",
                    "latitude": lat,
                    "longitude": lon
                })
                .to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_lists_endpoints() {
        let app = build_router(Backend::volatile());
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert!(json["endpoints"]["addSchool"].is_string());
        assert!(json["endpoints"]["listSchools"].is_string());
    }

    #[tokio::test]
    async fn test_add_then_list_ranked() {
        let app = build_router(Backend::volatile());

        // Two Gurugram schools; listed from Delhi the second one is closer.
        let resp = app.clone().oneshot(post_school("R1", 28.4595, 77.0266)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["storage"], "memory");
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("note").is_none());

        let resp = app.clone().oneshot(post_school("R2", 28.4430, 77.0552)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/listSchools?latitude=28.6139&longitude=77.2090")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["name"], "R2");
        assert_eq!(data[1]["name"], "R1");
        assert!(
            data[0]["distance_km"].as_f64().unwrap() < data[1]["distance_km"].as_f64().unwrap()
        );
        assert_eq!(json["userLocation"]["latitude"].as_f64().unwrap(), 28.6139);
        assert_eq!(json["userLocation"]["longitude"].as_f64().unwrap(), 77.2090);
        assert_eq!(json["storage"], "memory");
    }

    #[tokio::test]
    async fn test_list_empty_is_empty() {
        let app = build_router(Backend::volatile());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/listSchools?latitude=0&longitude=0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_school_rejects_blank_name() {
        let app = build_router(Backend::volatile());
        let resp = app.oneshot(post_school("   ", 28.6, 77.2)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert!(json["message"].as_str().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn test_add_school_rejects_out_of_range_latitude() {
        let app = build_router(Backend::volatile());
        let resp = app.oneshot(post_school("Polar", 91.0, 10.0)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["message"].as_str().unwrap().contains("latitude"));
    }

    #[tokio::test]
    async fn test_list_requires_both_coordinates() {
        let app = build_router(Backend::volatile());
        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/listSchools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/listSchools?latitude=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["message"].as_str().unwrap().contains("longitude"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(Backend::volatile());
        let resp = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Endpoint not found");
    }
}
