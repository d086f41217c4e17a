//! Client IP extraction, used as the admission-layer principal fallback
//! for unauthenticated requests (the `/auth/*` routes).

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::net::{IpAddr, SocketAddr};

#[derive(Clone, Debug)]
pub struct ClientIp(pub IpAddr);

/// Priority: `X-Forwarded-For` (first hop), then `X-Real-IP`, then the
/// socket's own peer address. `ConnectInfo` is optional so this layer
/// degrades gracefully (falls through to header-only extraction) when
/// the service is run without `into_make_service_with_connect_info`.
pub async fn extract_client_ip(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    mut request: Request,
    next: Next,
) -> Response {
    let ip = if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        forwarded
            .to_str()
            .ok()
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    } else if let Some(real_ip) = request.headers().get("x-real-ip") {
        real_ip.to_str().ok().and_then(|s| s.parse::<IpAddr>().ok())
    } else {
        connect_info.map(|ConnectInfo(addr)| addr.ip())
    };

    if let Some(ip) = ip {
        request.extensions_mut().insert(ClientIp(ip));
    }

    next.run(request).await
}
