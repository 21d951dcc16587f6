use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::{collections::HashSet, sync::Arc};

use crate::{accounts, admin, transfers, wagers};
use engine::Engine;

static USER_ID_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub operators: Arc<HashSet<String>>,
}

/// The authenticated caller, attached to every request by the auth
/// middleware.
///
/// `operator` is true iff the caller id is on the configured allowlist;
/// handlers forward it to the engine, which re-validates it.
#[derive(Clone, Debug)]
pub struct Caller {
    pub user_id: String,
    pub operator: bool,
}

/// `TypedHeader` for the verified caller id.
///
/// Requests must carry an "x-user-id" entry in the header, set by the
/// authenticating front. Identity verification itself is out of scope here.
#[derive(Debug)]
struct UserIdHeader(String);

impl Header for UserIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        if value.is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(UserIdHeader(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-user-id header"),
        }
    }
}

async fn auth(
    user_header: TypedHeader<UserIdHeader>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = user_header.0.0.clone();
    let operator = state.operators.contains(&user_id);

    request.extensions_mut().insert(Caller { user_id, operator });
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/balance", get(accounts::get_balance))
        .route("/transactions", get(accounts::list_transactions))
        .route("/transfer", post(transfers::create))
        .route("/admin/add", post(admin::add))
        .route("/admin/remove", post(admin::remove))
        .route("/coinflip", post(wagers::propose))
        .route("/coinflip/{id}/accept", post(wagers::accept))
        .route("/coinflip/{id}/decline", post(wagers::decline))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, operators: HashSet<String>, bind: &str, port: u16) {
    let listener = match tokio::net::TcpListener::bind((bind, port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, operators, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    operators: HashSet<String>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        operators: Arc::new(operators),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    operators: HashSet<String>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, operators, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

/// Builds the full service without binding a listener. Used by tests to
/// drive requests through `tower::ServiceExt`.
pub fn app(engine: Engine, operators: HashSet<String>) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
        operators: Arc::new(operators),
    })
}
