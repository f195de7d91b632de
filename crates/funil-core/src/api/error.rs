use reqwest::StatusCode;
use thiserror::Error;

/// Uniform error for every backend call.
///
/// `Display` is the string shown to the operator: the server-supplied
/// message when there is one, otherwise a generic message for the status.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Erro de rede: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Resposta inválida: {0}")]
    InvalidResponse(String),

    #[error("Cabeçalho inválido: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Maximum length for server messages carried in errors
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a message to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncado, {} bytes no total)", &body[..end], body.len())
    }

    /// Pull the human-readable message out of an error body.
    /// The backend uses `msg`; `message` wins when both are present.
    fn server_message(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        ["message", "msg", "error"]
            .iter()
            .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|msg| !msg.is_empty())
            .map(str::to_string)
    }

    fn generic_message(status: StatusCode) -> String {
        match status.as_u16() {
            401 => "Não autorizado - o token pode ter expirado".to_string(),
            403 => "Acesso negado".to_string(),
            404 => "Recurso não encontrado".to_string(),
            429 => "Muitas requisições - aguarde antes de tentar novamente".to_string(),
            500..=599 => format!("Erro no servidor ({})", status.as_u16()),
            _ => format!("Falha na requisição ({})", status.as_u16()),
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = Self::server_message(body)
            .map(|msg| Self::truncate_body(&msg))
            .unwrap_or_else(|| Self::generic_message(status));
        ApiError::Status { status, message }
    }

    /// HTTP status of a rejected request, if the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(e) if e.is_connect() || e.is_timeout() || e.is_request())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_prefers_message_over_msg() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Nome obrigatório", "msg": "Missing required fields"}"#,
        );
        assert_eq!(err.to_string(), "Nome obrigatório");
    }

    #[test]
    fn test_from_status_reads_backend_msg() {
        let err = ApiError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"msg": "Bad username or password"}"#,
        );
        assert_eq!(err.to_string(), "Bad username or password");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_from_status_generic_fallbacks() {
        assert_eq!(
            ApiError::from_status(StatusCode::NOT_FOUND, "<html>nope</html>").to_string(),
            "Recurso não encontrado"
        );
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "").to_string(),
            "Erro no servidor (502)"
        );
        assert_eq!(
            ApiError::from_status(StatusCode::CONFLICT, r#"{"msg": "   "}"#).to_string(),
            "Falha na requisição (409)"
        );
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let long = "é".repeat(400); // 800 bytes
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.ends_with("(truncado, 800 bytes no total)"));
        assert!(truncated.len() < long.len());

        assert_eq!(ApiError::truncate_body("short"), "short");
    }
}
