// HTTP middleware

use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Stamp every request with a UUID and echo it back in the response.
pub fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::x_request_id(MakeRequestUuid),
        PropagateRequestIdLayer::x_request_id(),
    )
}

/// Body limit sized for base64 uploads. A 30MB audio recording is ~40MB of
/// base64, so 50MB leaves headroom for the JSON envelope around it.
pub fn upload_body_limit() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(50 * 1024 * 1024)
}

/// The dashboard is served from a different origin than this API.
pub fn cors() -> CorsLayer {
    CorsLayer::permissive()
}
