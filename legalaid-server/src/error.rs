use legalaid_api::{Error as ApiError, TopicId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    pub fn topic_not_found(id: TopicId) -> Error {
        Error::Api(ApiError::TopicNotFound(id))
    }

    pub fn invalid_identity(header: &str) -> Error {
        Error::Api(ApiError::InvalidIdentity(String::from(header)))
    }

    pub fn invalid_body(reason: String) -> Error {
        Error::Api(ApiError::InvalidBody(reason))
    }

    pub fn unknown_route(path: String) -> Error {
        Error::Api(ApiError::UnknownRoute(path))
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let err = match self {
            Error::Anyhow(err) => {
                tracing::error!(?err, "internal server error");
                #[cfg(not(test))]
                let err =
                    ApiError::Unknown(String::from("Internal server error, see logs for details"));
                #[cfg(test)]
                let err = ApiError::Unknown(format!("Internal server error: {err:?}"));
                err
            }
            Error::Api(err) => {
                tracing::info!("returning error to client: {err}");
                err
            }
        };
        (
            err.status_code(),
            [(
                axum::http::header::CONTENT_TYPE,
                axum::http::HeaderValue::from_static("application/json"),
            )],
            err.contents(),
        )
            .into_response()
    }
}
