use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error,
};
use futures::future::{ready, Ready};

use super::AppError;

/// Header a client must send to read through the maintenance gate.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Debug, Clone, Default)]
pub struct MaintenanceConfig {
    pub enabled: bool,
    pub admin_key: Option<String>,
}

impl MaintenanceConfig {
    /// Decides whether a request may pass. Only GET requests are gated.
    pub fn allows(&self, method: &Method, admin_key: Option<&str>) -> bool {
        if !self.enabled || method != Method::GET {
            return true;
        }

        match (&self.admin_key, admin_key) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }
}

/// Rejects GET requests with 503 while maintenance mode is on, unless
/// the `x-admin-key` header carries the configured secret.
pub struct Maintenance {
    config: Rc<MaintenanceConfig>,
}

impl Maintenance {
    pub fn new(config: MaintenanceConfig) -> Self {
        Maintenance { config: Rc::new(config) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Maintenance
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = MaintenanceService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MaintenanceService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct MaintenanceService<S> {
    service: Rc<S>,
    config: Rc<MaintenanceConfig>,
}

impl<S, B> Service<ServiceRequest> for MaintenanceService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let admin_key = req
            .headers()
            .get(ADMIN_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        if !self.config.allows(req.method(), admin_key) {
            log::warn!("maintenance mode: rejected GET {}", req.path());
            let res = req.error_response(AppError::ServiceUnavailable);
            return Box::pin(async move { Ok(res.map_into_right_body()) });
        }

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    fn enabled() -> MaintenanceConfig {
        MaintenanceConfig {
            enabled: true,
            admin_key: Some(String::from("21277a4356b4ff62")),
        }
    }

    #[actix_rt::test]
    async fn test_allows() {
        let config = enabled();
        assert!(!config.allows(&Method::GET, None));
        assert!(!config.allows(&Method::GET, Some("wrong")));
        assert!(config.allows(&Method::GET, Some("21277a4356b4ff62")));
        assert!(config.allows(&Method::POST, None));
        assert!(config.allows(&Method::DELETE, Some("wrong")));

        let disabled = MaintenanceConfig::default();
        assert!(disabled.allows(&Method::GET, None));
    }

    #[actix_rt::test]
    async fn test_gate() {
        let app = test::init_service(
            App::new()
                .wrap(Maintenance::new(enabled()))
                .route("/posts", web::get().to(|| async { HttpResponse::Ok().finish() }))
                .route("/posts", web::post().to(|| async { HttpResponse::Created().finish() })),
        )
        .await;

        let req = test::TestRequest::get().uri("/posts").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let req = test::TestRequest::get()
            .uri("/posts")
            .insert_header((ADMIN_KEY_HEADER, "nope"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let req = test::TestRequest::get()
            .uri("/posts")
            .insert_header((ADMIN_KEY_HEADER, "21277a4356b4ff62"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post().uri("/posts").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[actix_rt::test]
    async fn test_gate_disabled() {
        let app = test::init_service(
            App::new()
                .wrap(Maintenance::new(MaintenanceConfig::default()))
                .route("/users", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = test::TestRequest::get().uri("/users").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
