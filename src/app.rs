use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{require_api_key, require_auth, ApiResponse, ApiResult};
use crate::state::AppState;

/// Full application router with state applied
pub fn app(state: AppState) -> Router {
    let mut api = Router::new()
        .nest("/users", user_routes(&state))
        .nest("/courses", course_routes(&state))
        .nest("/lessons", lesson_routes(&state))
        .nest("/enrollments", enrollment_routes(&state))
        .nest("/likes", like_routes(&state))
        .nest("/dashboards", dashboard_routes(&state));

    if state.payments.is_some() {
        api = api.nest("/payments", payment_routes(&state));
    }

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api)
        // Global middleware
        .layer(DefaultBodyLimit::max(state.config.api.max_upload_bytes))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn authenticated(state: &AppState, router: Router<AppState>) -> Router<AppState> {
    router.route_layer(from_fn_with_state(state.clone(), require_auth))
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/register", post(public::users::register))
        .route("/login", post(public::users::login))
        .route("/logout", post(public::users::logout))
        .route("/refresh", post(public::users::refresh));

    let own = Router::new()
        .route("/current", get(protected::users::current))
        .route("/:user_id/profile/image", post(protected::users::upload_profile_image))
        .route("/:user_id/cover/image", post(protected::users::upload_cover_image))
        .route("/:user_id/updateprofile", put(protected::users::update_profile))
        .route("/:user_id/changepassword", put(protected::users::change_password))
        .route("/:user_id/delete", delete(protected::users::delete_account));

    let admin = Router::new()
        .route("/", get(elevated::users::list))
        .route_layer(from_fn_with_state(state.clone(), require_api_key));

    open.merge(authenticated(state, own)).merge(admin)
}

fn course_routes(state: &AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/", get(public::courses::by_category))
        .route("/listCategory", get(public::courses::list_categories))
        .route("/getFree", get(public::courses::free))
        .route("/allCourses", get(public::courses::all))
        .route("/:course_id", get(public::courses::detail));

    let educator = Router::new()
        .route("/createCourse", post(protected::courses::create))
        .route("/:course_id/updateCourse", post(protected::courses::update))
        .route("/:course_id/updateThumbnail", post(protected::courses::update_thumbnail));

    open.merge(authenticated(state, educator))
}

fn lesson_routes(state: &AppState) -> Router<AppState> {
    authenticated(
        state,
        Router::new()
            .route(
                "/:course_id",
                get(protected::lessons::list).post(protected::lessons::create),
            )
            .route(
                "/:course_id/:lesson_id",
                post(protected::lessons::add_video)
                    .put(protected::lessons::update)
                    .delete(protected::lessons::delete),
            )
            .route(
                "/:course_id/:lesson_id/:video_id",
                delete(protected::lessons::delete_video),
            ),
    )
}

fn enrollment_routes(state: &AppState) -> Router<AppState> {
    let open = Router::new().route("/popularCourses", get(public::enrollments::popular));

    let student = Router::new().route(
        "/:course_id",
        get(protected::enrollments::toggle).post(protected::enrollments::toggle),
    );

    open.merge(authenticated(state, student))
}

fn like_routes(state: &AppState) -> Router<AppState> {
    authenticated(
        state,
        Router::new().route(
            "/:course_id/toggleLike",
            get(protected::likes::toggle).post(protected::likes::toggle),
        ),
    )
}

fn dashboard_routes(state: &AppState) -> Router<AppState> {
    authenticated(
        state,
        Router::new()
            .route("/", get(protected::dashboards::student))
            .route("/educator", get(protected::dashboards::educator)),
    )
}

fn payment_routes(state: &AppState) -> Router<AppState> {
    authenticated(
        state,
        Router::new()
            .route("/createOrder", post(protected::payments::create_order))
            .route("/verifyPayment", post(protected::payments::verify_payment)),
    )
}

/// Credentialed CORS for the configured origins; `*` falls back to permissive
/// (and therefore cookie-less) CORS
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
        ])
}

async fn root() -> ApiResult<Value> {
    Ok(ApiResponse::success(
        json!({
            "name": "E-learning API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "users": "/api/v1/users/*",
                "courses": "/api/v1/courses/*",
                "lessons": "/api/v1/lessons/:courseId/*",
                "enrollments": "/api/v1/enrollments/*",
                "likes": "/api/v1/likes/:courseId/toggleLike",
                "dashboards": "/api/v1/dashboards[/educator]",
                "payments": "/api/v1/payments/* (when configured)",
                "health": "/health",
            }
        }),
        "Service is running",
    ))
}

async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => Ok(ApiResponse::success(
            json!({ "status": "ok", "timestamp": now, "database": "ok" }),
            "Healthy",
        )),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("Database unavailable"))
        }
    }
}
