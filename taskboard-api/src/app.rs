/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// The state is generic over the [`Store`], so the same router runs against
/// PostgreSQL in production and the in-memory store in tests.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::AppState, config::Config};
/// use taskboard_shared::auth::password::Argon2Encoder;
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_shared::service::Services;
/// use taskboard_shared::store::postgres::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig { url: config.database.url.clone(), ..Default::default() }).await?;
/// let services = Services::new(Arc::new(PgStore::new(pool)), Arc::new(Argon2Encoder::default()));
///
/// let app = taskboard_api::app::build_router(AppState::new(services, config));
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use taskboard_shared::repository::Store;
use taskboard_shared::service::Services;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
pub struct AppState<S: Store> {
    /// Engine services
    pub services: Arc<Services<S>>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            services: Arc::clone(&self.services),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: Store> AppState<S> {
    /// Creates new application state
    pub fn new(services: Services<S>, config: Config) -> Self {
        Self {
            services: Arc::new(services),
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                         # Health check (public)
/// └── /api/
///     ├── POST   /login               # Token issue (public)
///     ├── POST   /users               # Registration (public)
///     ├── GET    /users               # everything below requires a token
///     ├── GET    /users/:id
///     ├── PUT    /users/:id
///     ├── DELETE /users/:id
///     ├── ...    /task_statuses[/:id]
///     ├── ...    /labels[/:id]
///     └── ...    /tasks[/:id]         # GET /tasks takes assigneeId, status, labelId, titleCont
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-route basis)
pub fn build_router<S: Store>(state: AppState<S>) -> Router {
    let auth = axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer::<S>);

    let health_routes = Router::new().route("/health", get(routes::health::health_check::<S>));

    // Registration is public, listing users is not
    let public_routes = Router::new()
        .route("/login", post(routes::auth::login::<S>))
        .route(
            "/users",
            get(routes::users::index::<S>)
                .route_layer(auth.clone())
                .post(routes::users::create::<S>),
        );

    let protected_routes = Router::new()
        .route(
            "/users/:id",
            get(routes::users::show::<S>)
                .put(routes::users::update::<S>)
                .delete(routes::users::destroy::<S>),
        )
        .route(
            "/task_statuses",
            get(routes::task_statuses::index::<S>).post(routes::task_statuses::create::<S>),
        )
        .route(
            "/task_statuses/:id",
            get(routes::task_statuses::show::<S>)
                .put(routes::task_statuses::update::<S>)
                .delete(routes::task_statuses::destroy::<S>),
        )
        .route(
            "/labels",
            get(routes::labels::index::<S>).post(routes::labels::create::<S>),
        )
        .route(
            "/labels/:id",
            get(routes::labels::show::<S>)
                .put(routes::labels::update::<S>)
                .delete(routes::labels::destroy::<S>),
        )
        .route(
            "/tasks",
            get(routes::tasks::index::<S>).post(routes::tasks::create::<S>),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::show::<S>)
                .put(routes::tasks::update::<S>)
                .delete(routes::tasks::destroy::<S>),
        )
        .route_layer(auth);

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    let cors = cors_layer(&state.config);
    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// CORS policy from configuration
///
/// `*` yields a permissive policy (development). Otherwise only the listed
/// origins are allowed, and `X-Total-Count` is exposed to them.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(routes::TOTAL_COUNT_HEADER)])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
