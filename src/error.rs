use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("mail: {0}")]
    Mail(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("chat completion contained no reply")]
    EmptyReply,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Upstream and local failures surface as a generic 500; detail stays in the log.
        tracing::error!("request failed: {self}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(serde_json::json!({ "error": "internal server error" })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn upstream_failure_is_500_without_details() {
        let err = Error::Upstream {
            service: "chat",
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: "rate limit exceeded for key gsk-secret".into(),
        };
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal server error");
    }

    #[test]
    fn display_names_the_service() {
        let err = Error::Upstream {
            service: "speech",
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: "bad key".into(),
        };
        assert_eq!(err.to_string(), "speech returned 401 Unauthorized: bad key");
    }
}
