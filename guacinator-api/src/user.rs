use std::collections::BTreeMap;

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct User {
    pub username: String,

    /// Only ever sent, the gateway never returns it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, Option<String>>,
}

impl User {
    pub fn new(username: String, password: String) -> User {
        User {
            username,
            password: Some(password),
            attributes: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        crate::validate_name("username", &self.username)
    }
}
