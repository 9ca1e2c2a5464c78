use actix_web::{http::StatusCode, HttpResponse, ResponseError};

#[derive(Debug, thiserror::Error)]
pub(super) enum ApiError {
    /// The query ran fine but matched nothing.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

#[derive(serde::Serialize)]
struct MessageJsonResp {
    message: String,
}

#[derive(serde::Serialize)]
struct ErrJsonResp {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::NotFound(message) | Self::BadRequest(message) => {
                tracing::debug!("{message}");
                HttpResponse::build(self.status_code()).json(MessageJsonResp {
                    message: message.clone(),
                })
            }
            Self::Internal(err) => {
                tracing::error!("fail to handle request: {err:#}");
                HttpResponse::InternalServerError().json(ErrJsonResp {
                    error: format!("{err:#}"),
                })
            }
        }
    }
}
