use std::{
    convert::Infallible,
    net::{IpAddr, SocketAddr},
};

use axum::{
    Form, Json, RequestPartsExt,
    extract::{ConnectInfo, FromRef, FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
};

use crate::{
    error::ApiError,
    types::{ConnectionInfo, LoginRequest, TrustedProxies},
};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// The client address as seen by the outermost of `trusted` proxies.
///
/// Each proxy appends the address it received the request from, so the right-most `trusted`
/// entries were written by our own proxies and the entry just left of them is the client.
/// Entries further left are client supplied and ignored.
fn forwarded_ip(headers: &HeaderMap, trusted: usize) -> Option<IpAddr> {
    if trusted == 0 {
        return None;
    }

    let hops: Vec<&str> = headers
        .get_all(FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect();

    let client = hops.len().checked_sub(trusted).map_or(hops.first(), |i| hops.get(i))?;
    client.parse().ok()
}

impl<S> FromRequestParts<S> for ConnectionInfo
where
    TrustedProxies: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TrustedProxies(trusted) = TrustedProxies::from_ref(state);

        let peer = parts
            .extract::<ConnectInfo<SocketAddr>>()
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip());

        let ip = peer.map(|peer| forwarded_ip(&parts.headers, trusted).unwrap_or(peer));

        Ok(ConnectionInfo {
            ip: ip.map(|ip| ip.to_string()),
        })
    }
}

/// Login credentials from either a JSON body or an urlencoded form.
pub struct LoginPayload(pub LoginRequest);

impl<S> FromRequest<S> for LoginPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.starts_with("application/json"));

        if is_json {
            let Json(payload) = Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(LoginPayload(payload))
        } else {
            let Form(payload) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(LoginPayload(payload))
        }
    }
}
