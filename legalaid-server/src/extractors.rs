use std::sync::Arc;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts},
    http::{request, Request},
    Json,
};
use legalaid_api::{UserRef, USER_ID_HEADER, USER_IMAGE_HEADER, USER_NAME_HEADER};

use crate::{Error, Forum, MemStore, TopicFeeds};

pub type AppForum = Forum<MemStore>;

#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
    pub forum: Arc<AppForum>,
    pub feeds: TopicFeeds,
}

/// The user the authentication layer vouched for, if any
pub struct Identity(pub Option<UserRef>);

fn header(req: &request::Parts, name: &str) -> Result<Option<String>, Error> {
    req.headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map(String::from)
                .map_err(|_| Error::invalid_identity(name))
        })
        .transpose()
}

#[async_trait]
impl<S: Sync> FromRequestParts<S> for Identity {
    type Rejection = Error;

    async fn from_request_parts(req: &mut request::Parts, _state: &S) -> Result<Identity, Error> {
        let id = match header(req, USER_ID_HEADER)? {
            None => return Ok(Identity(None)),
            Some(id) => id,
        };
        let name = header(req, USER_NAME_HEADER)?
            .ok_or_else(|| Error::invalid_identity(USER_NAME_HEADER))?;
        let profile_image = header(req, USER_IMAGE_HEADER)?;
        legalaid_api::validate_required(USER_ID_HEADER, &id)?;
        legalaid_api::validate_required(USER_NAME_HEADER, &name)?;
        Ok(Identity(Some(UserRef {
            id,
            name,
            profile_image,
        })))
    }
}

/// JSON request body whose rejections use the usual error envelope
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, B, T> FromRequest<S, B> for JsonBody<T>
where
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
    S: Send + Sync,
    B: Send + 'static,
{
    type Rejection = Error;

    async fn from_request(req: Request<B>, state: &S) -> Result<JsonBody<T>, Error> {
        match <Json<T> as FromRequest<S, B>>::from_request(req, state).await {
            Ok(Json(data)) => Ok(JsonBody(data)),
            Err(rejection) => Err(Error::invalid_body(rejection.body_text())),
        }
    }
}
