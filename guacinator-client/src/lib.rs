use guacinator_api::AuthToken;

mod client;
pub use client::{reset_admin_password, ClientConfig, GuacClient};

mod error;
pub use error::Error;

mod request;
pub use request::{AdminUserRequest, ConnectionRequest};


pub mod api {
    pub use guacinator_api::*;
}

/// The administrative operations the command line front end can dispatch to
#[async_trait::async_trait]
pub trait GuacService {
    async fn create_connection(&self, req: &ConnectionRequest) -> Result<(), Error>;

    /// Creates the user, then grants it every administrative system permission in one batch
    async fn create_admin_user(&self, req: &AdminUserRequest) -> Result<(), Error>;

    async fn delete_user(&self, username: &str) -> Result<(), Error>;

    /// Opens a fresh session, independent of the one the service itself holds
    async fn fetch_token(&self, username: &str, password: &str) -> Result<AuthToken, Error>;

    async fn reset_admin_password(
        &self,
        token: &AuthToken,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error>;
}
