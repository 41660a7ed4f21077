use guacinator_api::{
    AuthToken, AuthenticationResponse, Connection, Error as ApiError, NewSession, PasswordChange,
    PermissionPatch, User, GUACADMIN, PASSWORD_DATA_SOURCE, TOKEN_HEADER,
};
use reqwest::{Response, StatusCode, Url};

use crate::{AdminUserRequest, ConnectionRequest, Error, GuacService};

/// Where and as whom to connect
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// `scheme://host[:port]`, without trailing slash
    pub url: String,
    pub username: String,
    pub password: String,
    pub disable_tls_verification: bool,
}

impl ClientConfig {
    /// `host` may already carry its own scheme, in which case `scheme` is ignored
    pub fn new(scheme: &str, host: &str, username: String, password: String) -> ClientConfig {
        let host = host.trim_end_matches('/');
        ClientConfig {
            url: match host.contains("://") {
                true => String::from(host),
                false => format!("{scheme}://{host}"),
            },
            username,
            password,
            disable_tls_verification: true,
        }
    }
}

/// An authenticated session with a Guacamole gateway
pub struct GuacClient {
    http: reqwest::Client,
    url: Url,
    token: AuthToken,
    data_source: String,
}

impl GuacClient {
    /// Authenticates against the gateway, remembering the token and data source it hands out
    pub async fn connect(cfg: &ClientConfig) -> Result<GuacClient, Error> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(cfg.disable_tls_verification)
            .build()?;
        let url = base_url(&cfg.url)?;
        let auth = request_token(&http, &url, &cfg.username, &cfg.password).await?;
        tracing::debug!(
            user = %auth.username,
            data_source = %auth.data_source,
            "connected to {}",
            cfg.url
        );
        Ok(GuacClient {
            http,
            url,
            token: auth.auth_token,
            data_source: auth.data_source,
        })
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    fn data_url(&self, path: &[&str]) -> Result<Url, Error> {
        let mut segments = vec!["api", "session", "data", self.data_source.as_str()];
        segments.extend_from_slice(path);
        endpoint(&self.url, &segments)
    }

    pub async fn create_user(&self, user: &User) -> Result<User, Error> {
        let resp = self
            .http
            .post(self.data_url(&["users"])?)
            .header(TOKEN_HEADER, &self.token.0)
            .json(user)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn set_user_permissions(
        &self,
        username: &str,
        patches: &[PermissionPatch],
    ) -> Result<(), Error> {
        let resp = self
            .http
            .patch(self.data_url(&["users", username, "permissions"])?)
            .header(TOKEN_HEADER, &self.token.0)
            .json(patches)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn create_guac_connection(&self, conn: &Connection) -> Result<Connection, Error> {
        let resp = self
            .http
            .post(self.data_url(&["connections"])?)
            .header(TOKEN_HEADER, &self.token.0)
            .json(conn)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn remove_user(&self, username: &str) -> Result<(), Error> {
        let resp = self
            .http
            .delete(self.data_url(&["users", username])?)
            .header(TOKEN_HEADER, &self.token.0)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

/// Parses `scheme://host[:port][/prefix]` into a URL that endpoint paths can be appended to
fn base_url(url: &str) -> Result<Url, Error> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl {
        url: String::from(url),
        reason: e.to_string(),
    })?;
    if parsed.cannot_be_a_base() {
        return Err(Error::InvalidUrl {
            url: String::from(url),
            reason: String::from("no host to send requests to"),
        });
    }
    Ok(parsed)
}

/// Appends `segments` to `base`, percent-encoding each of them as a single path segment
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, Error> {
    // `.` and `..` would be dropped or resolved instead of reaching the gateway
    if let Some(s) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
        return Err(Error::InvalidPathSegment(String::from(*s)));
    }
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::InvalidUrl {
            url: base.to_string(),
            reason: String::from("no host to send requests to"),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn request_token(
    http: &reqwest::Client,
    url: &Url,
    username: &str,
    password: &str,
) -> Result<AuthenticationResponse, Error> {
    let resp = http
        .post(endpoint(url, &["api", "tokens"])?)
        .form(&NewSession {
            username: String::from(username),
            password: String::from(password),
        })
        .send()
        .await?;
    Ok(check(resp).await?.json().await?)
}

/// Changes the `guacadmin` password through the fixed `postgresql` data source.
///
/// Anything other than `204 No Content` is a failure.
pub async fn reset_admin_password(
    http: &reqwest::Client,
    url: &str,
    token: &AuthToken,
    old_password: &str,
    new_password: &str,
) -> Result<(), Error> {
    let url = endpoint(
        &base_url(url)?,
        &[
            "api",
            "session",
            "data",
            PASSWORD_DATA_SOURCE,
            "users",
            GUACADMIN,
            "password",
        ],
    )?;
    let resp = http
        .put(url)
        .header(TOKEN_HEADER, &token.0)
        .json(&PasswordChange {
            old_password: String::from(old_password),
            new_password: String::from(new_password),
        })
        .send()
        .await?;
    if resp.status() == StatusCode::NO_CONTENT {
        return Ok(());
    }
    Err(error_from(resp).await)
}

async fn check(resp: Response) -> Result<Response, Error> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(error_from(resp).await)
    }
}

async fn error_from(resp: Response) -> Error {
    let status = resp.status();
    let body = match resp.bytes().await {
        Ok(body) => body,
        Err(e) => return Error::Http(e),
    };
    match ApiError::parse(&body) {
        Ok(err) => Error::Api(err),
        Err(_) => Error::UnexpectedStatus {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        },
    }
}

#[async_trait::async_trait]
impl GuacService for GuacClient {
    async fn create_connection(&self, req: &ConnectionRequest) -> Result<(), Error> {
        let created = self.create_guac_connection(&req.to_connection()).await?;
        tracing::info!(
            id = ?created.identifier,
            host = %req.host,
            "created connection {}",
            req.name
        );
        Ok(())
    }

    async fn create_admin_user(&self, req: &AdminUserRequest) -> Result<(), Error> {
        self.create_user(&req.to_user()).await?;
        tracing::debug!("created user {}, granting admin permissions", req.username);
        // the user is left in place if this fails
        self.set_user_permissions(&req.username, &AdminUserRequest::permissions())
            .await
            .map_err(|e| Error::PartialAdmin {
                username: req.username.clone(),
                source: Box::new(e),
            })?;
        tracing::info!("created admin user {}", req.username);
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> Result<(), Error> {
        self.remove_user(username).await?;
        tracing::info!("deleted user {username}");
        Ok(())
    }

    async fn fetch_token(&self, username: &str, password: &str) -> Result<AuthToken, Error> {
        Ok(request_token(&self.http, &self.url, username, password)
            .await?
            .auth_token)
    }

    async fn reset_admin_password(
        &self,
        token: &AuthToken,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        reset_admin_password(
            &self.http,
            self.url.as_str(),
            token,
            old_password,
            new_password,
        )
        .await?;
        tracing::info!("changed the {GUACADMIN} password");
        Ok(())
    }
}
