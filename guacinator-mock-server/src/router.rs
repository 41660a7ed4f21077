use std::{net::SocketAddr, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{header, request, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, patch, post, put},
    Form, Json, Router,
};
use guacinator_api::{
    AuthToken, AuthenticationResponse, Connection, Error, NewSession, PasswordChange,
    PermissionPatch, User, TOKEN_HEADER,
};
use tokio::sync::Mutex;

use crate::MockServer;

pub type SharedServer = Arc<Mutex<MockServer>>;

pub struct Rejection(Error);

impl From<Error> for Rejection {
    fn from(err: Error) -> Rejection {
        Rejection(err)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        tracing::info!("returning error to client: {}", self.0);
        (
            self.0.status_code(),
            [(header::CONTENT_TYPE, "application/json")],
            self.0.contents(),
        )
            .into_response()
    }
}

/// Session token, from the `Guacamole-Token` header or the `token` query parameter
pub struct Token(pub AuthToken);

#[async_trait]
impl<S: Sync> FromRequestParts<S> for Token {
    type Rejection = Rejection;

    async fn from_request_parts(req: &mut request::Parts, _state: &S) -> Result<Token, Rejection> {
        if let Some(tok) = req.headers.get(TOKEN_HEADER) {
            let tok = tok.to_str().map_err(|_| Error::PermissionDenied)?;
            return Ok(Token(AuthToken(String::from(tok))));
        }
        req.uri
            .query()
            .into_iter()
            .flat_map(|q| q.split('&'))
            .find_map(|kv| kv.strip_prefix("token="))
            .map(|tok| Token(AuthToken(String::from(tok))))
            .ok_or(Rejection(Error::PermissionDenied))
    }
}

pub fn app(server: SharedServer) -> Router {
    Router::new()
        .route("/api/tokens", post(tokens))
        .route("/api/session/data/:source/users", post(create_user))
        .route(
            "/api/session/data/:source/users/:username",
            delete(delete_user),
        )
        .route(
            "/api/session/data/:source/users/:username/permissions",
            patch(patch_permissions),
        )
        .route(
            "/api/session/data/:source/users/:username/password",
            put(change_password),
        )
        .route(
            "/api/session/data/:source/connections",
            post(create_connection),
        )
        .with_state(server)
}

/// Serve `server` on an ephemeral localhost port for the lifetime of the runtime
pub fn spawn(server: MockServer) -> (SocketAddr, SharedServer) {
    let shared = Arc::new(Mutex::new(server));
    let srv = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
        .serve(app(shared.clone()).into_make_service());
    let addr = srv.local_addr();
    tracing::debug!("mock gateway listening on {}", addr);
    tokio::spawn(async move {
        if let Err(err) = srv.await {
            tracing::error!(?err, "mock gateway stopped");
        }
    });
    (addr, shared)
}

async fn tokens(
    State(server): State<SharedServer>,
    Form(session): Form<NewSession>,
) -> Result<Json<AuthenticationResponse>, Rejection> {
    Ok(Json(server.lock().await.auth(session)?))
}

async fn create_user(
    State(server): State<SharedServer>,
    Token(tok): Token,
    Path(source): Path<String>,
    Json(user): Json<User>,
) -> Result<Json<User>, Rejection> {
    Ok(Json(server.lock().await.create_user(&tok, &source, user)?))
}

async fn delete_user(
    State(server): State<SharedServer>,
    Token(tok): Token,
    Path((source, username)): Path<(String, String)>,
) -> Result<StatusCode, Rejection> {
    server.lock().await.delete_user(&tok, &source, &username)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn patch_permissions(
    State(server): State<SharedServer>,
    Token(tok): Token,
    Path((source, username)): Path<(String, String)>,
    Json(patches): Json<Vec<PermissionPatch>>,
) -> Result<StatusCode, Rejection> {
    server
        .lock()
        .await
        .patch_permissions(&tok, &source, &username, patches)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_password(
    State(server): State<SharedServer>,
    Token(tok): Token,
    Path((source, username)): Path<(String, String)>,
    Json(change): Json<PasswordChange>,
) -> Result<StatusCode, Rejection> {
    server
        .lock()
        .await
        .change_password(&tok, &source, &username, change)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_connection(
    State(server): State<SharedServer>,
    Token(tok): Token,
    Path(source): Path<String>,
    Json(conn): Json<Connection>,
) -> Result<Json<Connection>, Rejection> {
    Ok(Json(
        server.lock().await.create_connection(&tok, &source, conn)?,
    ))
}
