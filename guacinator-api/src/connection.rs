/// Identifier of the connection group every gateway starts with
pub const ROOT_GROUP: &str = "ROOT";

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Assigned by the gateway on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub name: String,
    pub parent_identifier: String,
    pub protocol: String,
    #[serde(default)]
    pub parameters: ConnectionParameters,
    #[serde(default)]
    pub attributes: ConnectionAttributes,
}

impl Connection {
    pub fn validate(&self) -> Result<(), crate::Error> {
        crate::validate_name("connection name", &self.name)?;
        crate::validate_name("protocol", &self.protocol)?;
        if let Some(port) = &self.parameters.port {
            port.parse::<u16>()
                .map_err(|_| crate::Error::BadRequest(format!("Invalid port {port:?}")))?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ConnectionParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectionAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections_per_user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vnc(port: &str) -> Connection {
        Connection {
            identifier: None,
            name: String::from("desk"),
            parent_identifier: String::from(ROOT_GROUP),
            protocol: String::from("vnc"),
            parameters: ConnectionParameters {
                hostname: Some(String::from("10.0.0.5")),
                port: Some(String::from(port)),
                password: Some(String::from("secret")),
            },
            attributes: ConnectionAttributes {
                max_connections: Some(String::from("2")),
                max_connections_per_user: Some(String::from("1")),
            },
        }
    }

    #[test]
    fn wire_format() {
        assert_eq!(
            serde_json::to_value(vnc("5900")).unwrap(),
            serde_json::json!({
                "name": "desk",
                "parentIdentifier": "ROOT",
                "protocol": "vnc",
                "parameters": {"hostname": "10.0.0.5", "port": "5900", "password": "secret"},
                "attributes": {"max-connections": "2", "max-connections-per-user": "1"},
            })
        );
    }

    #[test]
    fn validate_port() {
        assert_eq!(vnc("5900").validate(), Ok(()));
        assert!(matches!(
            vnc("99999").validate(),
            Err(crate::Error::BadRequest(_))
        ));
    }
}
