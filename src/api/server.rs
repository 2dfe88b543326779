use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{Next, from_fn};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::api::handler::*;
use crate::api::middleware;
use crate::db::models::vote::UnknownCategory;
use crate::db::prelude::*;
use crate::reputation::prelude::*;
use crate::util::env::{Env, EnvErr, Var};
use crate::var;

pub type JsonResult<T> = core::result::Result<Json<T>, RouteError>;

pub struct AppState {
    pub ledger: Arc<dyn VoteLedger + Send + Sync>,
    pub writer: Arc<dyn VoteWriter + Send + Sync>,
    pub catalog: Arc<dyn ProfileCatalog + Send + Sync>,
    pub policy: Arc<dyn VoteEligibilityGuard + Send + Sync>,
    pub badges: BadgeResolver,
}

impl AppState {
    pub fn postgres(pool: &'static PgPool, env: &Env) -> Self {
        let votes = Arc::new(VoteRepository::new(pool));

        Self {
            ledger: votes.clone(),
            writer: votes,
            catalog: Arc::new(ProfileRepository::new(pool)),
            policy: Arc::new(VotePolicy::from_env(env)),
            badges: BadgeResolver::standard(),
        }
    }
}

pub fn router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(|| async { Response::new(Body::empty()) }))
        .route("/leaderboard", get(leaderboard))
        //
        // badge ladder
        .route("/badges", get(badge_ladder))
        .route("/badges/current", get(current_badge))
        .route("/badges/progress", get(badge_progress))
        //
        // per-profile
        .route("/profile/{id}/reputation", get(profile_reputation))
        .route("/vote", post(cast_vote).delete(retract_vote))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method();
                let uri = req.uri();

                let matched_path = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|matched| matched.as_str());

                tracing::debug_span!("api_request", ?method, ?uri, ?matched_path)
            }),
        )
        .layer(from_fn(log_route_errors))
        .layer(cors)
        .with_state(state)
}

/// Logs any `RouteError` a handler attached to its response.
#[instrument(skip(request, next), fields(uri = request.uri().to_string()))]
async fn log_route_errors(request: Request, next: Next) -> Response {
    let res = next.run(request).await;
    if let Some(err) = res.extensions().get::<Arc<RouteError>>() {
        tracing::error!(error = ?err, "error occurred inside route handler");
    }

    res
}

#[instrument(skip(state))]
pub async fn start_server(state: AppState) -> Result<JoinHandle<std::io::Result<()>>, RouteError> {
    let port_var = var!(Var::ServerApiPort).await?;
    let port = port_var
        .parse::<u16>()
        .map_err(|_| RouteError::InvalidPort(port_var.to_string()))?;

    let cors = middleware::cors(var!(Var::CorsAllowOrigins).await?);
    let app = router(Arc::new(state), cors);

    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    let listener = tokio::net::TcpListener::bind(socket_addr).await?;

    tracing::info!(
        server_url = &format!("http://127.0.0.1:{}", socket_addr.port()),
        "server ready"
    );

    Ok(tokio::task::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutdown signal received");
            })
            .await
    }))
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Rejected(#[from] VoteRejection),

    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),

    #[error("unknown profile '{0}'")]
    UnknownProfile(ProfileId),

    #[error("no vote from '{}' for '{}'", .0.voter_id, .0.profile_id)]
    NoSuchVote(VoteKey),

    #[error("invalid server port '{0}'")]
    InvalidPort(String),

    #[error(transparent)]
    EnvError(#[from] EnvErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let message = self.to_string();
        let status = match &self {
            RouteError::UnknownCategory(_) => StatusCode::BAD_REQUEST,
            RouteError::Rejected(_) => StatusCode::FORBIDDEN,
            RouteError::UnknownProfile(_) | RouteError::NoSuchVote(_) => StatusCode::NOT_FOUND,
            RouteError::Leaderboard(_) | RouteError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            RouteError::InvalidPort(_) | RouteError::EnvError(_) | RouteError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut response = (status, Json(ErrorResponse { message })).into_response();

        // client mistakes aren't worth an error log
        if status.is_server_error() {
            response.extensions_mut().insert(Arc::new(self));
        }

        response
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reputation::testing::{MemoryStore, vote};
    use axum::body::to_bytes;
    use http::Method;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app_with(store: MemoryStore, policy: VotePolicy) -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(store);
        let state = AppState {
            ledger: store.clone(),
            writer: store.clone(),
            catalog: store.clone(),
            policy: Arc::new(policy),
            badges: BadgeResolver::standard(),
        };

        (router(Arc::new(state), middleware::cors("*")), store)
    }

    fn app(store: MemoryStore) -> (Router, Arc<MemoryStore>) {
        app_with(store, VotePolicy::default())
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = http::Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    #[tokio::test]
    async fn test_leaderboard_route() {
        let store = MemoryStore::default()
            .with_profiles(["p1", "p2", "v1", "v2", "v3"])
            .with_votes([
                vote("p1", "v1", "top1"),
                vote("p1", "v2", "top1"),
                vote("p2", "v3", "top50"),
            ]);
        let (app, _) = app(store);

        let (status, body) = send(app, Method::GET, "/leaderboard", None).await;

        assert_eq!(status, StatusCode::OK);
        let board = body.as_array().unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0]["id"], "p1");
        assert_eq!(board[0]["score"], 100);
        assert_eq!(board[0]["counts"]["top1"], 2);
        assert_eq!(board[1]["id"], "p2");
        assert_eq!(board[1]["ranking"], 2);
    }

    #[tokio::test]
    async fn test_empty_leaderboard_is_ok() {
        let (app, _) = app(MemoryStore::default());
        let (status, body) = send(app, Method::GET, "/leaderboard", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_leaderboard_store_failure() {
        let store = MemoryStore {
            fail_catalog: true,
            ..MemoryStore::default()
        }
        .with_votes([vote("p1", "v1", "top1")]);
        let (app, _) = app(store);

        let (status, body) = send(app, Method::GET, "/leaderboard", None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["message"].as_str().unwrap().contains("catalog"));
    }

    #[tokio::test]
    async fn test_badge_routes() {
        let (app, _) = app(MemoryStore::default());

        let (status, body) =
            send(app.clone(), Method::GET, "/badges/progress?score=1750", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current"]["level"], 1);
        assert_eq!(body["next"]["min_score"], 3000);
        assert_eq!(body["percent"], 50.0);

        let (_, body) = send(app.clone(), Method::GET, "/badges/current?score=10", None).await;
        assert_eq!(body, Value::Null);

        let (_, body) =
            send(app.clone(), Method::GET, "/badges/current?score=200000", None).await;
        assert_eq!(body["level"], 9);

        let (_, body) = send(app, Method::GET, "/badges", None).await;
        assert_eq!(body.as_array().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_revote_replaces() {
        let store = MemoryStore::default().with_profiles(["p1", "v1"]);
        let (app, store) = app(store);

        for category in ["top1", "top50"] {
            let (status, _) = send(
                app.clone(),
                Method::POST,
                "/vote",
                Some(json!({ "voter_id": "v1", "profile_id": "p1", "category": category })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        assert_eq!(store.votes().len(), 1);

        let (status, body) = send(app, Method::GET, "/profile/p1/reputation", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 5);
        assert_eq!(body["counts"]["top50"], 1);
        assert_eq!(body["badge"]["next"]["level"], 1);
    }

    #[tokio::test]
    async fn test_vote_rejections() {
        let store = MemoryStore::default().with_profiles(["p1", "v1"]);
        let (app, store) = app(store);

        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/vote",
            Some(json!({ "voter_id": "p1", "profile_id": "p1", "category": "top1" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/vote",
            Some(json!({ "voter_id": "v1", "profile_id": "p1", "category": "top3" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("top3"));

        let (status, _) = send(
            app,
            Method::POST,
            "/vote",
            Some(json!({ "voter_id": "ghost", "profile_id": "p1", "category": "top1" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert!(store.votes().is_empty());
    }

    #[tokio::test]
    async fn test_retract_vote() {
        let store = MemoryStore::default()
            .with_profiles(["p1", "v1"])
            .with_votes([vote("p1", "v1", "top1")]);
        let (app, store) = app(store);
        let key = json!({ "voter_id": "v1", "profile_id": "p1" });

        let (status, _) = send(app.clone(), Method::DELETE, "/vote", Some(key.clone())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(store.votes().is_empty());

        let (status, _) = send(app, Method::DELETE, "/vote", Some(key)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_retraction_disabled() {
        let store = MemoryStore::default()
            .with_profiles(["p1", "v1"])
            .with_votes([vote("p1", "v1", "top1")]);
        let policy = VotePolicy {
            allow_retraction: false,
            ..VotePolicy::default()
        };
        let (app, store) = app_with(store, policy);

        let (status, _) = send(
            app,
            Method::DELETE,
            "/vote",
            Some(json!({ "voter_id": "v1", "profile_id": "p1" })),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(store.votes().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_profile_reputation() {
        let (app, _) = app(MemoryStore::default());
        let (status, body) = send(app, Method::GET, "/profile/nobody/reputation", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "unknown profile 'nobody'");
    }
}
