use guacinator_api::{
    Connection, ConnectionAttributes, ConnectionParameters, PermissionPatch, SystemPermission,
    User, ROOT_GROUP,
};

pub const VNC_PROTOCOL: &str = "vnc";
pub const MAX_CONNECTIONS: u32 = 2;
pub const MAX_CONNECTIONS_PER_USER: u32 = 1;

/// A VNC target to register on the gateway
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectionRequest {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl ConnectionRequest {
    pub fn to_connection(&self) -> Connection {
        Connection {
            identifier: None,
            name: self.name.clone(),
            parent_identifier: String::from(ROOT_GROUP),
            protocol: String::from(VNC_PROTOCOL),
            parameters: ConnectionParameters {
                hostname: Some(self.host.clone()),
                port: Some(self.port.to_string()),
                password: Some(self.password.clone()),
            },
            attributes: ConnectionAttributes {
                max_connections: Some(MAX_CONNECTIONS.to_string()),
                max_connections_per_user: Some(MAX_CONNECTIONS_PER_USER.to_string()),
            },
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminUserRequest {
    pub username: String,
    pub password: String,
}

impl AdminUserRequest {
    pub fn to_user(&self) -> User {
        User::new(self.username.clone(), self.password.clone())
    }

    /// The single permission batch granted after creating the user
    pub fn permissions() -> Vec<PermissionPatch> {
        SystemPermission::ADMIN_SET
            .into_iter()
            .map(PermissionPatch::add_system)
            .collect()
    }
}
