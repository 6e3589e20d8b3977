//! Request extractors: caller identification from headers, and JSON/query wrappers whose
//! rejections use the API error body.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
    Json,
    extract::{ConnectInfo, FromRef, FromRequest, FromRequestParts, Query, Request},
    http::{HeaderMap, request::Parts},
};
use serde::de::DeserializeOwned;

use crate::{error::AppError, services::admission::CallerContext, state::SharedState};

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";
const CLIENT_ID: &str = "x-client-id";
const ACCOUNT_TIER: &str = "x-account-tier";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Address the trusted proxy saw: the last `x-forwarded-for` hop, then `x-real-ip`.
fn proxied_addr(headers: &HeaderMap) -> Option<&str> {
    header(headers, FORWARDED_FOR)
        .and_then(|chain| chain.rsplit(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .or_else(|| header(headers, REAL_IP))
}

fn client_addr(parts: &Parts, trust_forwarded_for: bool) -> String {
    let forwarded = trust_forwarded_for
        .then(|| proxied_addr(&parts.headers))
        .flatten()
        .map(str::to_owned);
    forwarded
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".into())
}

impl<S> FromRequestParts<S> for CallerContext
where
    SharedState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = SharedState::from_ref(state);
        Ok(CallerContext {
            addr: client_addr(parts, app.config().trust_forwarded_for),
            client_id: header(&parts.headers, CLIENT_ID).map(str::to_owned),
            premium: header(&parts.headers, ACCOUNT_TIER)
                .is_some_and(|tier| tier.eq_ignore_ascii_case("premium")),
        })
    }
}

/// [`Json`] whose rejections are reported as [`AppError`].
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// [`Query`] whose rejections are reported as [`AppError`].
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}
