use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

use stockroom_observability::{REQUEST_ID_HEADER, RequestId};

/// Attach a request id to the request and echo it in `x-request-id`.
///
/// A caller-supplied id is reused when it is sane; otherwise a UUIDv7 is generated.
/// The trace layer and handlers read the id from request extensions.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_header(
        req.headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );
    req.extensions_mut().insert(id.clone());

    let mut res = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}
