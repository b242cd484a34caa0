use bytes::Bytes;

/// The error taxonomy. Every kind maps to exactly one client status code
/// and one log `error_category`; upstream HTTP errors carry their original
/// status/body through unchanged, never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    ForbiddenModel,
    RateLimited,
    UnknownModel,
    NoProvider,
    TransformError,
    ScriptError,
    UpstreamHttpError,
    UpstreamNetworkError,
    UpstreamTimeout,
    TtftTimeout,
    ClientDisconnect,
    InternalError,
}

impl ErrorKind {
    /// Client-visible HTTP status for proxy-generated errors.
    /// `UpstreamHttpError` is handled separately: its status is the verbatim
    /// upstream status, not derived from the kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden | ErrorKind::ForbiddenModel => 403,
            ErrorKind::RateLimited => 429,
            ErrorKind::UnknownModel => 404,
            ErrorKind::NoProvider => 503,
            ErrorKind::TransformError | ErrorKind::InternalError | ErrorKind::ScriptError => 500,
            ErrorKind::UpstreamHttpError => 502,
            ErrorKind::UpstreamNetworkError => 502,
            ErrorKind::UpstreamTimeout | ErrorKind::TtftTimeout => 504,
            ErrorKind::ClientDisconnect => 499,
        }
    }

    /// The `error_category` recorded on the per-request log record.
    pub fn log_category(self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::ForbiddenModel => "forbidden_model",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::UnknownModel => "unknown_model",
            ErrorKind::NoProvider => "no_provider",
            ErrorKind::TransformError => "transform_error",
            ErrorKind::ScriptError => "script_error",
            ErrorKind::UpstreamHttpError => "upstream_http_error",
            ErrorKind::UpstreamNetworkError => "upstream_network_error",
            ErrorKind::UpstreamTimeout => "upstream_timeout",
            ErrorKind::TtftTimeout => "ttft_timeout",
            ErrorKind::ClientDisconnect => "client_disconnect",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

/// The single error type returned by fallible core functions. Carries enough
/// structure to render both the client response and the log record without
/// re-deriving either.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GproxyError {
    #[error("{kind:?}: {message}")]
    Proxy { kind: ErrorKind, message: String },

    /// An upstream 4xx/5xx response, passed through verbatim.
    #[error("upstream http error: status={status}")]
    UpstreamHttp {
        status: u16,
        body: Bytes,
        content_type: Option<String>,
    },
}

impl GproxyError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        GproxyError::Proxy {
            kind,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn forbidden_model(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ForbiddenModel, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    pub fn unknown_model(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownModel, message)
    }

    pub fn no_provider(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoProvider, message)
    }

    pub fn transform_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransformError, message)
    }

    pub fn script_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ScriptError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GproxyError::Proxy { kind, .. } => *kind,
            GproxyError::UpstreamHttp { .. } => ErrorKind::UpstreamHttpError,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            GproxyError::Proxy { kind, .. } => kind.status_code(),
            GproxyError::UpstreamHttp { status, .. } => *status,
        }
    }

    pub fn log_category(&self) -> &'static str {
        self.kind().log_category()
    }

    /// Body matching the *client* protocol's error shape, except for
    /// upstream pass-through, whose body is the upstream body verbatim.
    pub fn client_body(&self, client_error_type: &str) -> Bytes {
        match self {
            GproxyError::UpstreamHttp { body, .. } => body.clone(),
            GproxyError::Proxy { message, .. } => {
                let payload = serde_json::json!({
                    "error": {
                        "type": client_error_type,
                        "message": message,
                    }
                });
                Bytes::from(payload.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_http_error_surfaces_status_and_body_verbatim() {
        for status in [400u16, 404, 429, 500, 503, 599] {
            let body = Bytes::from(format!("upstream said {status}"));
            let err = GproxyError::UpstreamHttp { status, body: body.clone(), content_type: None };
            assert_eq!(err.status_code(), status);
            assert_eq!(err.client_body("upstream_http_error"), body);
        }
    }

    #[test]
    fn proxy_error_body_is_the_client_protocol_envelope() {
        let err = GproxyError::unauthorized("bad bearer token");
        let body = err.client_body(err.log_category());
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["type"], "unauthorized");
        assert_eq!(value["error"]["message"], "bad bearer token");
    }
}
