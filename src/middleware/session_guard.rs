/// Session guard middleware
///
/// Resolves the access token from the `Authorization: Bearer` header or the
/// `accessToken` cookie, and injects the authenticated user into request
/// extensions for use by route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::SessionGuard;
use crate::cookies::ACCESS_TOKEN_COOKIE;

/// Protects the routes it wraps; unauthenticated requests never reach them
pub struct SessionGuardMiddleware {
    guard: SessionGuard,
}

impl SessionGuardMiddleware {
    pub fn new(guard: SessionGuard) -> Self {
        Self { guard }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionGuardMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(SessionGuardService {
            service: Rc::new(service),
            guard: self.guard.clone(),
        }))
    }
}

pub struct SessionGuardService<S> {
    service: Rc<S>,
    guard: SessionGuard,
}

impl<S, B> Service<ServiceRequest> for SessionGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = access_token(&req);
        let guard = self.guard.clone();
        let service = self.service.clone();

        Box::pin(async move {
            match guard.authenticate(token.as_deref()).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service.call(req).await
                }
                Err(e) => {
                    tracing::debug!(path = %req.path(), "Session guard rejected request: {}", e);
                    Err(e.into())
                }
            }
        })
    }
}

/// Bearer header wins over the cookie when both are present
fn access_token(req: &ServiceRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        req.cookie(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}
