use std::fmt;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemPermission {
    Administer,
    CreateUser,
    CreateUserGroup,
    CreateConnection,
    CreateConnectionGroup,
    CreateSharingProfile,
}

impl SystemPermission {
    /// Everything an administrator created by this tool is granted
    pub const ADMIN_SET: [SystemPermission; 5] = [
        SystemPermission::Administer,
        SystemPermission::CreateUser,
        SystemPermission::CreateConnection,
        SystemPermission::CreateConnectionGroup,
        SystemPermission::CreateSharingProfile,
    ];
}

impl fmt::Display for SystemPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SystemPermission::Administer => "ADMINISTER",
            SystemPermission::CreateUser => "CREATE_USER",
            SystemPermission::CreateUserGroup => "CREATE_USER_GROUP",
            SystemPermission::CreateConnection => "CREATE_CONNECTION",
            SystemPermission::CreateConnectionGroup => "CREATE_CONNECTION_GROUP",
            SystemPermission::CreateSharingProfile => "CREATE_SHARING_PROFILE",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
}

/// One entry of the JSON-patch list sent to `PATCH .../users/{user}/permissions`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PermissionPatch {
    pub op: PatchOp,
    pub path: String,
    pub value: String,
}

impl PermissionPatch {
    pub const SYSTEM_PATH: &'static str = "/systemPermissions";

    pub fn add_system(perm: SystemPermission) -> PermissionPatch {
        PermissionPatch {
            op: PatchOp::Add,
            path: String::from(Self::SYSTEM_PATH),
            value: perm.to_string(),
        }
    }

    pub fn remove_system(perm: SystemPermission) -> PermissionPatch {
        PermissionPatch {
            op: PatchOp::Remove,
            path: String::from(Self::SYSTEM_PATH),
            value: perm.to_string(),
        }
    }

    /// Returns the system permission this patch targets, if any
    pub fn system_permission(&self) -> Option<SystemPermission> {
        if self.path != Self::SYSTEM_PATH {
            return None;
        }
        serde_json::from_value(serde_json::Value::String(self.value.clone())).ok()
    }
}
