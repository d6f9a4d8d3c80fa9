pub mod token;

use actix_web::{dev::Payload, web::Data, FromRequest, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use futures::future::LocalBoxFuture;

use crate::app::{AppError, AppState};
use token::Token;

/// The user a request acts on behalf of, resolved from its bearer token.
///
/// # Example
/// ```
/// #[post("/posts")]
/// async fn create_post(identity: Identity) -> HttpResponse {
///     HttpResponse::Ok().body(identity.user_id.to_string())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i32,
    pub token: String,
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let bearer = BearerAuth::extract(req);
        let app_state = req.app_data::<Data<AppState>>().cloned();

        Box::pin(async move {
            let token = bearer
                .await
                .map_err(|_| AppError::UnauthorizedError)?
                .token()
                .to_string();
            let app_state = app_state.ok_or(AppError::InternalServerError)?;

            let lookup = token.clone();
            let user_id = app_state
                .run_redis(move |conn| Token::find(conn, &lookup))
                .await?;

            Ok(Identity { user_id, token })
        })
    }
}
