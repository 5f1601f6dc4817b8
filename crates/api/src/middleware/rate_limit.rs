//! Per-identity fixed-window rate limiting (C9, §4.9), applied ahead of
//! every route. Identity is the caller's IP; `X-RateLimit-*` headers are
//! set on every response, and a rejection short-circuits with 429 plus
//! `Retry-After`. A limiter error (Redis unreachable) fails open: the
//! request proceeds and the failure is logged, never surfaced to the
//! caller (§4.9).

use crate::state::AppState;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, HttpResponse};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};

pub struct RateLimitMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService { service }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let identity = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let fut = self.service.call(req);

        Box::pin(async move {
            let Some(state) = state else {
                let res = fut.await?;
                return Ok(res.map_into_left_body());
            };

            if !state.config.rate_limit.enabled {
                let res = fut.await?;
                return Ok(res.map_into_left_body());
            }

            match state.rate_limiter.check_and_increment(&identity).await {
                Ok(decision) if !decision.allowed => {
                    biblio_gateway_core::metrics::record_rate_limit_rejection(&identity);
                    let response = HttpResponse::TooManyRequests()
                        .insert_header(("Retry-After", decision.reset_seconds.to_string()))
                        .insert_header(("X-RateLimit-Limit", decision.limit.to_string()))
                        .insert_header(("X-RateLimit-Remaining", "0"))
                        .insert_header(("X-RateLimit-Reset", decision.reset_seconds.to_string()))
                        .json(biblio_gateway_core::envelope::Envelope::<()>::error(
                            "rate limit exceeded",
                            Some(biblio_gateway_core::types::ErrorCode::RateLimitExceeded),
                            None,
                        ));
                    let (http_req, _) = fut.await?.into_parts();
                    return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
                }
                Ok(decision) => {
                    let mut res = fut.await?;
                    let headers = res.headers_mut();
                    headers.insert(
                        actix_web::http::header::HeaderName::from_static("x-ratelimit-limit"),
                        decision.limit.to_string().parse().unwrap(),
                    );
                    headers.insert(
                        actix_web::http::header::HeaderName::from_static("x-ratelimit-remaining"),
                        decision.remaining.to_string().parse().unwrap(),
                    );
                    headers.insert(
                        actix_web::http::header::HeaderName::from_static("x-ratelimit-reset"),
                        decision.reset_seconds.to_string().parse().unwrap(),
                    );
                    return Ok(res.map_into_left_body());
                }
                Err(e) => {
                    tracing::warn!(error = %e, identity, "rate limiter failed, failing open");
                    let res = fut.await?;
                    return Ok(res.map_into_left_body());
                }
            }
        })
    }
}
