use actix_web::http::{header::ContentType, StatusCode};
use actix_web::HttpResponse;
use derive_more::Display;

pub type HttpResult = Result<HttpResponse, AppHttpError>;

#[derive(Debug, Display)]
pub enum AppHttpError {
    #[display(fmt = "Internal error.")]
    Internal,

    #[display(fmt = "Invalid input: {_0}")]
    InvalidInput(String),

    #[display(fmt = "Not found.")]
    NotFound,

    #[display(fmt = "Unauthenticated.")]
    Unauthenticated,

    #[display(fmt = "Unauthorized.")]
    Unauthorized,

    #[display(fmt = "{_0}")]
    Conflict(String),
}

impl std::error::Error for AppHttpError {}

impl actix_web::error::ResponseError for AppHttpError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppHttpError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            AppHttpError::NotFound => StatusCode::NOT_FOUND,
            AppHttpError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppHttpError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppHttpError::Unauthorized => StatusCode::FORBIDDEN,
            AppHttpError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<crate::engine::Error> for AppHttpError {
    fn from(e: crate::engine::Error) -> Self {
        use crate::engine::Error;
        match e {
            Error::InvalidInput(s) => AppHttpError::InvalidInput(s),
            Error::NotFound(s) => {
                log::trace!("Not found: {s}");
                AppHttpError::NotFound
            }
            Error::Conflict(s) => AppHttpError::Conflict(s),
            Error::Denied => AppHttpError::Unauthorized,
            Error::Db(e) => {
                log::error!("{e}");
                AppHttpError::Internal
            }
        }
    }
}
