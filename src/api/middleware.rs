use http::request::Parts as ReqParts;
use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// `*` allows any origin; anything else is matched as an origin suffix, e.g. `.example.com`.
pub fn cors(allowed: &'static str) -> CorsLayer {
    let allow_origin = if allowed == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::predicate(move |org: &HeaderValue, _: &ReqParts| {
            org.as_bytes().ends_with(allowed.as_bytes())
        })
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_origin(allow_origin)
}
