use std::fmt;

/// Data source the password change endpoint is always routed through
pub const PASSWORD_DATA_SOURCE: &str = "postgresql";

/// Built-in administrator account shipped with every gateway
pub const GUACADMIN: &str = "guacadmin";

/// Header carrying the session token on authenticated calls
pub const TOKEN_HEADER: &str = "Guacamole-Token";

/// Form body of `POST /api/tokens`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewSession {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthToken(pub String);

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    pub auth_token: AuthToken,
    pub username: String,
    pub data_source: String,
    #[serde(default)]
    pub available_data_sources: Vec<String>,
}

/// Body of `PUT /api/session/data/{source}/users/{user}/password`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}
