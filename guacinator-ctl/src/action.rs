use anyhow::Context;
use guacinator_client::{AdminUserRequest, ConnectionRequest, GuacService};

use crate::GuacamoleOpt;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum UsageError {
    #[error(
        "You must provide --connection, --vnc-pw and --vnc-ip to add a new connection in Guacamole"
    )]
    IncompleteConnection,
}

/// What a single invocation does, picked from the flags in a fixed priority order
#[derive(Debug, Eq, PartialEq)]
pub enum Action {
    SetAdminPassword {
        username: String,
        old_password: String,
        new_password: String,
    },
    CreateConnection(ConnectionRequest),
    DeleteUser(String),
    CreateAdmin(AdminUserRequest),
    Nothing,
}

fn given(flag: &Option<String>) -> Option<&str> {
    flag.as_deref().filter(|v| !v.is_empty())
}

impl Action {
    pub fn select(opt: &GuacamoleOpt, vnc_port: u16) -> Result<Action, UsageError> {
        if let Some(new_password) = given(&opt.guacadmin_pw) {
            return Ok(Action::SetAdminPassword {
                username: opt.username.clone(),
                old_password: opt.password.clone(),
                new_password: String::from(new_password),
            });
        }

        match (
            given(&opt.connection),
            given(&opt.vnc_pw),
            given(&opt.vnc_ip),
        ) {
            (Some(name), Some(password), Some(host)) => {
                return Ok(Action::CreateConnection(ConnectionRequest {
                    name: String::from(name),
                    host: String::from(host),
                    port: vnc_port,
                    password: String::from(password),
                }))
            }
            (None, None, None) => (),
            // stricter than letting a stray --vnc-ip or --vnc-pw fall through to the
            // user actions: any partial connection flag set aborts the whole run
            _ => return Err(UsageError::IncompleteConnection),
        }

        if let Some(user) = given(&opt.delete_user) {
            return Ok(Action::DeleteUser(String::from(user)));
        }

        if let Some(user) = given(&opt.new_admin) {
            return Ok(Action::CreateAdmin(AdminUserRequest {
                username: String::from(user),
                password: opt.password.clone(),
            }));
        }

        Ok(Action::Nothing)
    }

    /// Performs the action, returning the line to report on success
    pub async fn run<S>(self, svc: &S) -> anyhow::Result<Option<String>>
    where
        S: GuacService + ?Sized + Sync,
    {
        match self {
            Action::SetAdminPassword {
                username,
                old_password,
                new_password,
            } => {
                let token = svc
                    .fetch_token(&username, &old_password)
                    .await
                    .context("Failed to get token from Guacamole")?;
                tracing::info!("Setting secure password for guacadmin");
                svc.reset_admin_password(&token, &old_password, &new_password)
                    .await
                    .context("Failed to set new Guacamole admin password")?;
                Ok(Some(String::from("Successfully set guacadmin password")))
            }
            Action::CreateConnection(req) => {
                svc.create_connection(&req).await.with_context(|| {
                    format!("Failed to create {} connection in Guacamole", req.name)
                })?;
                Ok(Some(format!("Successfully created connection {}", req.name)))
            }
            Action::DeleteUser(user) => {
                svc.delete_user(&user)
                    .await
                    .with_context(|| format!("Failed to delete {user} from Guacamole"))?;
                Ok(Some(format!("Successfully deleted {user}")))
            }
            Action::CreateAdmin(req) => {
                svc.create_admin_user(&req).await.with_context(|| {
                    format!("Failed to create {} admin in Guacamole", req.username)
                })?;
                Ok(Some(format!(
                    "Successfully created admin user {}",
                    req.username
                )))
            }
            Action::Nothing => Ok(None),
        }
    }
}
