//! Session authentication extractor.

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures::future::LocalBoxFuture;

use crate::{AppState, error::ApiError};

/// Header carrying the session id.
pub const SESSION_HEADER: &str = "x-session-id";

/// Extractor that requires a valid session.
///
/// Resolves the `x-session-id` header through the session store and
/// rejects the request with 401 when the header is missing or the session
/// is unknown.
///
/// ```rust,ignore
/// async fn handler(user: AuthenticatedUser) -> HttpResponse {
///     HttpResponse::Ok().body(user.user_id().to_string())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    /// Id of the user owning the session.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let session_id = req
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string);

        Box::pin(async move {
            let Some(state) = state else {
                log::error!("AppState missing from application data");
                return Err(ApiError::Internal("Server misconfigured".to_string()));
            };
            let session_id = session_id.ok_or(ApiError::Unauthorized)?;

            match state.sessions.resolve(&session_id).await {
                Ok(Some(user_id)) => Ok(Self(user_id)),
                Ok(None) => Err(ApiError::Unauthorized),
                Err(e) => Err(ApiError::internal("Failed to resolve session", &e)),
            }
        })
    }
}
