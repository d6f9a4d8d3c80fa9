use actix_web::{
    delete, post,
    web::{Data, Json},
    HttpResponse,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    app::{AppError, AppState},
    auth::{token::Token, Identity},
    services::{users, Message},
};

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(email(message = "email must be an email"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: usize,
}

/// Pipe for issuing a bearer token for an user
/// - url: `{domain}/auth/token`
///
/// # HTTP request requirements
/// ## body
/// - json object with the user `email`
///
/// # Response
/// ## Ok
/// - `201` with `{ "token": "...", "expiresIn": 3600 }`
/// ## Error
/// - Bad request
/// - Not found if no user has that email
#[post("/auth/token")]
pub async fn issue_token(app_state: Data<AppState>, body: Json<TokenRequest>) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request.validate()?;

    let user = app_state
        .run(move |conn| users::find_by_email(conn, &request.email))
        .await?;

    let ttl = app_state.token_ttl;
    let token = app_state
        .run_redis(move |conn| Token::new(conn, user.id, ttl))
        .await?;
    log::info!("issued token for user {}", user.id);

    Ok(HttpResponse::Created().json(IssuedToken { token, expires_in: ttl }))
}

/// Pipe for revoking the bearer token the request was made with
/// - url: `{domain}/auth/token`
///
/// # Response
/// ## Ok
/// ## Error
/// - Unauthorized
#[delete("/auth/token")]
pub async fn revoke_token(identity: Identity, app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let token = identity.token;
    app_state.run_redis(move |conn| Token::delete(conn, &token)).await?;
    log::info!("revoked token of user {}", identity.user_id);

    Ok(HttpResponse::Ok().json(Message::new("Token revoked")))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::{json, Value};

    use crate::{
        database::models::user::{NewUser, User},
        routes::{configure, testing},
    };

    #[actix_rt::test]
    async fn test_revoke_requires_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(testing::offline_state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::delete().uri("/auth/token").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/auth/token")
            .set_json(json!({ "email": "nope" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    #[ignore = "requires DATABASE_URL and a redis server on REDIS_URL"]
    async fn test_token_roundtrip() {
        let app_state = testing::live_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state.clone()))
                .configure(configure),
        )
        .await;

        let usr = User::create(
            &mut app_state.psql_pool.get().unwrap(),
            &NewUser {
                name: String::from("Token owner"),
                email: testing::unique_email(),
                bio: None,
            },
        )
        .unwrap();

        let req = test::TestRequest::post()
            .uri("/auth/token")
            .set_json(json!({ "email": usr.email }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let issued: Value = test::read_body_json(resp).await;
        let token = issued["token"].as_str().unwrap().to_string();
        assert_eq!(issued["expiresIn"], 60);

        let req = test::TestRequest::delete()
            .uri("/auth/token")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri("/auth/token")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        User::delete(&mut app_state.psql_pool.get().unwrap(), usr.id).unwrap();
    }
}
