use std::collections::{btree_map, BTreeMap, BTreeSet, HashMap};

use guacinator_api::{
    AuthToken, AuthenticationResponse, Connection, Error, NewSession, PasswordChange, PatchOp,
    PermissionPatch, SystemPermission, User, GUACADMIN, ROOT_GROUP,
};

mod router;
pub use router::{app, spawn, SharedServer};

pub const DEFAULT_DATA_SOURCE: &str = "postgresql";

/// In-memory model of the parts of a Guacamole gateway the client talks to
pub struct MockServer {
    data_source: String,
    users: BTreeMap<String, DbUser>,
    sessions: HashMap<AuthToken, String>,
    connections: BTreeMap<String, Connection>,
    next_connection_id: u64,
    permission_patches: Vec<(String, Vec<PermissionPatch>)>,
}

#[derive(Debug)]
struct DbUser {
    password: String,
    perms: BTreeSet<SystemPermission>,
}

impl MockServer {
    /// A fresh gateway, with only `guacadmin`/`guacadmin` provisioned
    pub fn new() -> MockServer {
        let mut users = BTreeMap::new();
        users.insert(
            String::from(GUACADMIN),
            DbUser {
                password: String::from(GUACADMIN),
                perms: SystemPermission::ADMIN_SET.into_iter().collect(),
            },
        );
        MockServer {
            data_source: String::from(DEFAULT_DATA_SOURCE),
            users,
            sessions: HashMap::new(),
            connections: BTreeMap::new(),
            next_connection_id: 1,
            permission_patches: Vec::new(),
        }
    }

    /// Provision a user directly, bypassing permission checks
    pub fn test_add_user(&mut self, name: &str, password: &str, perms: &[SystemPermission]) {
        self.users.insert(
            String::from(name),
            DbUser {
                password: String::from(password),
                perms: perms.iter().copied().collect(),
            },
        );
    }

    pub fn test_user_password(&self, name: &str) -> Option<&str> {
        self.users.get(name).map(|u| u.password.as_str())
    }

    pub fn test_user_permissions(&self, name: &str) -> Option<&BTreeSet<SystemPermission>> {
        self.users.get(name).map(|u| &u.perms)
    }

    pub fn test_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Every accepted permission patch call, in order, with its target user
    pub fn test_permission_patches(&self) -> &[(String, Vec<PermissionPatch>)] {
        &self.permission_patches
    }

    fn check_source(&self, data_source: &str) -> Result<(), Error> {
        if data_source != self.data_source {
            return Err(Error::NotFound(format!(
                "No such data source: \"{data_source}\""
            )));
        }
        Ok(())
    }

    fn resolve(&self, tok: &AuthToken) -> Result<&str, Error> {
        self.sessions
            .get(tok)
            .map(String::as_str)
            .ok_or(Error::PermissionDenied)
    }

    fn require(&self, tok: &AuthToken, perm: SystemPermission) -> Result<&str, Error> {
        let user = self.resolve(tok)?;
        let perms = &self
            .users
            .get(user)
            .ok_or(Error::PermissionDenied)?
            .perms;
        if perms.contains(&SystemPermission::Administer) || perms.contains(&perm) {
            Ok(user)
        } else {
            Err(Error::PermissionDenied)
        }
    }

    pub fn auth(&mut self, s: NewSession) -> Result<AuthenticationResponse, Error> {
        match self.users.get(&s.username) {
            Some(u) if u.password == s.password => {
                let tok = AuthToken(uuid::Uuid::new_v4().simple().to_string().to_uppercase());
                self.sessions.insert(tok.clone(), s.username.clone());
                Ok(AuthenticationResponse {
                    auth_token: tok,
                    username: s.username,
                    data_source: self.data_source.clone(),
                    available_data_sources: vec![self.data_source.clone()],
                })
            }
            _ => Err(Error::InvalidCredentials),
        }
    }

    pub fn create_user(
        &mut self,
        tok: &AuthToken,
        data_source: &str,
        mut u: User,
    ) -> Result<User, Error> {
        self.check_source(data_source)?;
        self.require(tok, SystemPermission::CreateUser)?;
        u.validate()?;

        match self.users.entry(u.username.clone()) {
            btree_map::Entry::Occupied(_) => Err(Error::BadRequest(format!(
                "User \"{}\" already exists.",
                u.username
            ))),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(DbUser {
                    password: u.password.take().unwrap_or_default(),
                    perms: BTreeSet::new(),
                });
                Ok(u)
            }
        }
    }

    pub fn delete_user(
        &mut self,
        tok: &AuthToken,
        data_source: &str,
        username: &str,
    ) -> Result<(), Error> {
        self.check_source(data_source)?;
        self.require(tok, SystemPermission::Administer)?;
        if self.users.remove(username).is_none() {
            return Err(Error::NotFound(format!("No such user: \"{username}\"")));
        }
        self.sessions.retain(|_, u| *u != username);
        Ok(())
    }

    /// Applies the whole batch or nothing at all
    pub fn patch_permissions(
        &mut self,
        tok: &AuthToken,
        data_source: &str,
        username: &str,
        patches: Vec<PermissionPatch>,
    ) -> Result<(), Error> {
        self.check_source(data_source)?;
        self.require(tok, SystemPermission::Administer)?;
        let mut changes = Vec::with_capacity(patches.len());
        for p in &patches {
            let perm = p.system_permission().ok_or_else(|| {
                Error::BadRequest(format!("Unsupported patch {} {}", p.path, p.value))
            })?;
            changes.push((p.op, perm));
        }
        let user = self
            .users
            .get_mut(username)
            .ok_or_else(|| Error::NotFound(format!("No such user: \"{username}\"")))?;
        for (op, perm) in changes {
            match op {
                PatchOp::Add => user.perms.insert(perm),
                PatchOp::Remove => user.perms.remove(&perm),
            };
        }
        self.permission_patches
            .push((String::from(username), patches));
        Ok(())
    }

    pub fn create_connection(
        &mut self,
        tok: &AuthToken,
        data_source: &str,
        mut c: Connection,
    ) -> Result<Connection, Error> {
        self.check_source(data_source)?;
        self.require(tok, SystemPermission::CreateConnection)?;
        c.validate()?;
        if c.parent_identifier != ROOT_GROUP {
            return Err(Error::NotFound(format!(
                "No such connection group: \"{}\"",
                c.parent_identifier
            )));
        }
        if self
            .connections
            .values()
            .any(|other| other.parent_identifier == c.parent_identifier && other.name == c.name)
        {
            return Err(Error::BadRequest(format!(
                "The connection \"{}\" already exists.",
                c.name
            )));
        }
        let id = self.next_connection_id.to_string();
        self.next_connection_id += 1;
        c.identifier = Some(id.clone());
        self.connections.insert(id, c.clone());
        Ok(c)
    }

    /// Users may only change their own password
    pub fn change_password(
        &mut self,
        tok: &AuthToken,
        data_source: &str,
        username: &str,
        change: PasswordChange,
    ) -> Result<(), Error> {
        self.check_source(data_source)?;
        if self.resolve(tok)? != username {
            return Err(Error::PermissionDenied);
        }
        let user = self
            .users
            .get_mut(username)
            .ok_or_else(|| Error::NotFound(format!("No such user: \"{username}\"")))?;
        if user.password != change.old_password {
            return Err(Error::PermissionDenied);
        }
        user.password = change.new_password;
        Ok(())
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(server: &mut MockServer, user: &str, pass: &str) -> AuthToken {
        server
            .auth(NewSession {
                username: String::from(user),
                password: String::from(pass),
            })
            .expect("logging in")
            .auth_token
    }

    #[test]
    fn wrong_password_is_rejected() {
        let mut server = MockServer::new();
        let res = server.auth(NewSession {
            username: String::from(GUACADMIN),
            password: String::from("nope"),
        });
        assert_eq!(res, Err(Error::InvalidCredentials));
    }

    #[test]
    fn duplicate_user_is_rejected() {
        let mut server = MockServer::new();
        let tok = login(&mut server, GUACADMIN, GUACADMIN);
        let u = User::new(String::from("alice"), String::from("pw"));
        server.create_user(&tok, "postgresql", u.clone()).unwrap();
        assert!(matches!(
            server.create_user(&tok, "postgresql", u),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn unprivileged_users_cannot_create_users() {
        let mut server = MockServer::new();
        server.test_add_user("bob", "pw", &[]);
        let tok = login(&mut server, "bob", "pw");
        let u = User::new(String::from("alice"), String::from("pw"));
        assert_eq!(
            server.create_user(&tok, "postgresql", u),
            Err(Error::PermissionDenied)
        );
    }

    #[test]
    fn invalid_patch_applies_nothing() {
        let mut server = MockServer::new();
        let tok = login(&mut server, GUACADMIN, GUACADMIN);
        server.test_add_user("alice", "pw", &[]);
        let patches = vec![
            PermissionPatch::add_system(SystemPermission::Administer),
            PermissionPatch {
                op: PatchOp::Add,
                path: String::from("/systemPermissions"),
                value: String::from("FLY"),
            },
        ];
        assert!(server
            .patch_permissions(&tok, "postgresql", "alice", patches)
            .is_err());
        assert!(server.test_user_permissions("alice").unwrap().is_empty());
        assert!(server.test_permission_patches().is_empty());
    }

    #[test]
    fn patches_add_and_remove() {
        let mut server = MockServer::new();
        let tok = login(&mut server, GUACADMIN, GUACADMIN);
        server.test_add_user("alice", "pw", &[SystemPermission::CreateUser]);
        server
            .patch_permissions(
                &tok,
                "postgresql",
                "alice",
                vec![
                    PermissionPatch::remove_system(SystemPermission::CreateUser),
                    PermissionPatch::add_system(SystemPermission::CreateConnection),
                ],
            )
            .unwrap();
        let perms = server.test_user_permissions("alice").unwrap();
        assert_eq!(
            perms.iter().copied().collect::<Vec<_>>(),
            [SystemPermission::CreateConnection]
        );
    }

    #[test]
    fn deleting_a_user_drops_their_sessions() {
        let mut server = MockServer::new();
        let admin = login(&mut server, GUACADMIN, GUACADMIN);
        server.test_add_user("alice", "pw", &SystemPermission::ADMIN_SET);
        let alice = login(&mut server, "alice", "pw");
        server.delete_user(&admin, "postgresql", "alice").unwrap();
        assert_eq!(
            server.delete_user(&alice, "postgresql", GUACADMIN),
            Err(Error::PermissionDenied)
        );
        assert!(matches!(
            server.delete_user(&admin, "postgresql", "alice"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn wrong_data_source_is_not_found() {
        let mut server = MockServer::new();
        let tok = login(&mut server, GUACADMIN, GUACADMIN);
        assert!(matches!(
            server.delete_user(&tok, "mysql", GUACADMIN),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn password_change_needs_old_password() {
        let mut server = MockServer::new();
        let tok = login(&mut server, GUACADMIN, GUACADMIN);
        let change = |old: &str| PasswordChange {
            old_password: String::from(old),
            new_password: String::from("n3w"),
        };
        assert_eq!(
            server.change_password(&tok, "postgresql", GUACADMIN, change("bad")),
            Err(Error::PermissionDenied)
        );
        server
            .change_password(&tok, "postgresql", GUACADMIN, change(GUACADMIN))
            .unwrap();
        assert_eq!(server.test_user_password(GUACADMIN), Some("n3w"));
    }
}
