use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::gate::AuthGate;
use crate::auth::token::TokenType;
use crate::error::{AppError, INVALID_TOKEN_MESSAGE};
use crate::models::AuthenticatedUser;

/// Resolves the bearer token of every request it wraps.
///
/// On success the [`AuthenticatedUser`] is stored in the request extensions for the
/// [`CurrentUser`](crate::auth::CurrentUser) extractor. On failure the request never
/// reaches the handler and a 401 is returned. Requires `web::Data<AuthGate>` in app data.
#[derive(Debug, Clone, Copy)]
pub struct AuthMiddleware {
    required: TokenType,
}

impl AuthMiddleware {
    /// Accepts access tokens only.
    pub fn access() -> Self {
        Self {
            required: TokenType::Access,
        }
    }

    /// Accepts refresh tokens only.
    pub fn refresh() -> Self {
        Self {
            required: TokenType::Refresh,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            required: self.required,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    required: TokenType,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required = self.required;

        Box::pin(async move {
            match authenticate(&req, required).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(app_err) => Ok(req.error_response(app_err).map_into_right_body()),
            }
        })
    }
}

async fn authenticate(
    req: &ServiceRequest,
    required: TokenType,
) -> Result<AuthenticatedUser, AppError> {
    let gate = req
        .app_data::<web::Data<AuthGate>>()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("AuthGate is not configured".into()))?;

    let token = bearer_token(req).ok_or_else(|| {
        log::warn!("rejected request to {}: no bearer token", req.path());
        AppError::Unauthorized(INVALID_TOKEN_MESSAGE.into())
    })?;

    gate.resolve_from_bearer_token(&token, Some(required)).await
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}
