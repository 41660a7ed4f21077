mod auth;
pub use auth::{
    AuthToken, AuthenticationResponse, NewSession, PasswordChange, GUACADMIN,
    PASSWORD_DATA_SOURCE, TOKEN_HEADER,
};

mod connection;
pub use connection::{Connection, ConnectionAttributes, ConnectionParameters, ROOT_GROUP};

mod error;
pub use error::Error;

mod permission;
pub use permission::{PatchOp, PermissionPatch, SystemPermission};

mod user;
pub use user::User;

pub fn validate_name(what: &str, s: &str) -> Result<(), Error> {
    if s.trim().is_empty() {
        return Err(Error::BadRequest(format!("The {what} must not be blank.")));
    }
    if s.contains('\0') {
        return Err(Error::BadRequest(format!(
            "Null byte in {what} is not allowed {s:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(validate_name("username", "alice"), Ok(()));
        assert!(validate_name("username", "").is_err());
        assert!(validate_name("username", "   ").is_err());
        assert!(validate_name("username", "al\0ice").is_err());
    }
}
