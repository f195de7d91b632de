use serde::{Deserialize, Serialize};

/// The operator returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
}

impl User {
    /// Name when the backend has one, email otherwise
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }

    /// Header greeting
    pub fn greeting(&self) -> String {
        format!("Olá, {}", self.display_name())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Login response. Only the token is interpreted; other fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Acknowledgement bodies such as `{"msg": "User created successfully"}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageResponse {
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_uses_email_without_name() {
        let user: User = serde_json::from_str(r#"{"id": 1, "email": "admin@funil.com"}"#).unwrap();
        assert_eq!(user.name, None);
        assert_eq!(user.greeting(), "Olá, admin@funil.com");
    }

    #[test]
    fn test_greeting_prefers_name() {
        let user: User = serde_json::from_str(
            r#"{"id": 2, "email": "ana@funil.com", "name": "Ana", "role": "admin", "is_active": true}"#,
        )
        .unwrap();
        assert_eq!(user.display_name(), "Ana");

        let blank = User { name: Some("  ".to_string()), ..user };
        assert_eq!(blank.display_name(), "ana@funil.com");
    }

    #[test]
    fn test_login_response_without_token() {
        let resp: LoginResponse = serde_json::from_str(r#"{"msg": "ok"}"#).unwrap();
        assert!(resp.access_token.is_none());
    }

    #[test]
    fn test_message_response_accepts_msg() {
        let resp: MessageResponse = serde_json::from_str(r#"{"msg": "User created successfully"}"#).unwrap();
        assert_eq!(resp.message.as_deref(), Some("User created successfully"));
    }
}
