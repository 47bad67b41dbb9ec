//! Router construction and server lifecycle.

use axum::{
    Router, middleware,
    response::{IntoResponse, Json},
    routing::{get, patch, post, put},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{comments, projects, states, task_states, tasks, users};
use crate::assist::Assistant;
use crate::auth::{TokenIssuer, password, require_auth};
use crate::db::Database;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub assistant: Assistant,
    pub tokens: Arc<TokenIssuer>,
    /// bcrypt work factor for new password hashes.
    pub password_cost: u32,
}

impl AppState {
    pub fn new(db: Arc<Database>, assistant: Assistant, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            db,
            assistant,
            tokens,
            password_cost: password::DEFAULT_COST,
        }
    }

    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Endpoint index.
async fn docs() -> impl IntoResponse {
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "auth": "Authorization: Bearer <token> on every route except users/register, users/login, health and docs",
        "providerHeader": super::MODEL_TYPE_HEADER,
        "endpoints": {
            "users": [
                "POST /api/users/register",
                "POST /api/users/login",
                "GET /api/users/update-token",
            ],
            "projects": [
                "POST /api/projects",
                "GET /api/projects",
                "DELETE /api/projects/{id}",
                "GET /api/projects/plan/{id}",
            ],
            "states": [
                "POST /api/states",
                "GET /api/states",
                "PUT /api/states/{id}",
                "DELETE /api/states/{id}",
            ],
            "taskStates": [
                "POST /api/taskstates",
                "GET /api/taskstates/task/{taskId}",
            ],
            "tasks": [
                "POST /api/tasks",
                "GET /api/tasks/project/{projectId}",
                "PUT /api/tasks/{id}",
                "PATCH /api/tasks/{id}/archive",
                "DELETE /api/tasks/{id}",
                "POST /api/tasks/gen-description",
                "POST /api/tasks/gen-description-by-id",
                "POST /api/tasks/propose",
            ],
            "comments": [
                "POST /api/comments",
                "PUT /api/comments/{id}",
                "DELETE /api/comments/{id}",
                "GET|POST /api/comments/{commentId}/respond",
            ],
            "health": "GET /api/health",
        }
    }))
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/api/users/update-token", get(users::update_token))
        // Projects
        .route(
            "/api/projects",
            post(projects::create_project).get(projects::list_projects),
        )
        .route(
            "/api/projects/{id}",
            axum::routing::delete(projects::delete_project),
        )
        .route("/api/projects/plan/{id}", get(projects::day_plan))
        // States
        .route(
            "/api/states",
            post(states::create_state).get(states::list_states),
        )
        .route(
            "/api/states/{id}",
            put(states::update_state).delete(states::delete_state),
        )
        // State assignments
        .route("/api/taskstates", post(task_states::assign_state))
        .route(
            "/api/taskstates/task/{task_id}",
            get(task_states::task_history),
        )
        // Tasks
        .route("/api/tasks", post(tasks::create_task))
        .route("/api/tasks/project/{project_id}", get(tasks::list_tasks))
        .route(
            "/api/tasks/gen-description",
            post(tasks::generate_description),
        )
        .route(
            "/api/tasks/gen-description-by-id",
            post(tasks::generate_description_by_id),
        )
        .route("/api/tasks/propose", post(tasks::propose_task))
        .route(
            "/api/tasks/{id}",
            put(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/api/tasks/{id}/archive", patch(tasks::archive_task))
        // Comments
        .route("/api/comments", post(comments::create_comment))
        .route(
            "/api/comments/{id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route(
            "/api/comments/{id}/respond",
            get(comments::respond).post(comments::respond),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.tokens),
            require_auth,
        ));

    Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/health", get(health))
        .route("/docs", get(docs))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on `addr`.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Taskboard API listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Taskboard API shutting down");
            })
            .await
        {
            tracing::error!("Taskboard API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}
