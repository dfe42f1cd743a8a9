//! API policy envelope

use serde::{Deserialize, Serialize};

/// How callers authenticate against an API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    Key,
    Jwt,
}

/// The policy envelope shared by all keys of one auth group.
///
/// Many keys reference the same `Api` through their `key_auth_id`;
/// it is created out of band and read-through cached by that id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Api {
    pub id: String,
    pub name: String,
    pub workspace_id: String,
    pub auth_type: AuthType,
    pub key_auth_id: String,
    /// Exact-match IP allowlist; empty disables the check.
    #[serde(default)]
    pub ip_whitelist: Vec<String>,
}

impl Api {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        workspace_id: impl Into<String>,
        auth_type: AuthType,
        key_auth_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            workspace_id: workspace_id.into(),
            auth_type,
            key_auth_id: key_auth_id.into(),
            ip_whitelist: Vec::new(),
        }
    }

    pub fn with_ip_whitelist(mut self, ips: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ip_whitelist = ips.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `source_ip` passes the allowlist. An empty allowlist
    /// admits everything.
    pub fn allows_ip(&self, source_ip: Option<&str>) -> bool {
        if self.ip_whitelist.is_empty() {
            return true;
        }
        match source_ip {
            Some(ip) => self.ip_whitelist.iter().any(|allowed| allowed == ip),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_api() -> Api {
        Api::new("api_1", "test", "ws_1", AuthType::Key, "ka_1")
    }

    #[test]
    fn test_empty_whitelist_admits_everything() {
        let api = test_api();
        assert!(api.allows_ip(Some("1.2.3.4")));
        assert!(api.allows_ip(None));
    }

    #[test]
    fn test_whitelist_exact_match() {
        let api = test_api().with_ip_whitelist(["100.100.100.100"]);
        assert!(api.allows_ip(Some("100.100.100.100")));
        assert!(!api.allows_ip(Some("1.2.3.4")));
        assert!(!api.allows_ip(None));
    }

    #[test]
    fn test_auth_type_wire_format() {
        let json = serde_json::to_string(&AuthType::Key).unwrap();
        assert_eq!(json, "\"key\"");
    }
}
