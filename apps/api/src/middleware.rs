use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use evidentia_core::PrincipalId;
use tracing::debug;

/// Header carrying the caller identity set by the authentication gateway.
pub const PRINCIPAL_HEADER: &str = "x-principal-id";

/// Caller identity attached to every request; `None` when unauthenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestPrincipal(pub Option<PrincipalId>);

pub async fn resolve_principal(mut request: Request, next: Next) -> Response {
    let principal = principal_from_request(&request);
    request.extensions_mut().insert(RequestPrincipal(principal));
    next.run(request).await
}

fn principal_from_request(request: &Request) -> Option<PrincipalId> {
    let raw = request.headers().get(PRINCIPAL_HEADER)?;
    let parsed = raw
        .to_str()
        .ok()
        .and_then(|value| value.parse::<PrincipalId>().ok());
    if parsed.is_none() {
        debug!("ignoring unparsable {PRINCIPAL_HEADER} header");
    }

    parsed
}
