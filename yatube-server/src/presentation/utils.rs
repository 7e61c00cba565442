use actix_web::dev::Payload;
use actix_web::http::header::LOCATION;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{Ready, ready};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use uuid::Uuid;

use crate::application::request_context::RequestContext;
use crate::presentation::middleware::RequestId;

pub const LOGIN_URL: &str = "/auth/login/";

/// Path segment: everything but unreserved characters and the username extras `@` `+`.
const SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'@')
    .remove(b'+');

/// Query value carrying a local path; `/` stays readable.
const NEXT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Falls back to an anonymous context when the identity middleware is not mounted.
impl FromRequest for RequestContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let ctx = req
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();
        ready(Ok(ctx))
    }
}

pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, location.as_ref()))
        .finish()
}

pub fn redirect_to_login(req: &HttpRequest) -> HttpResponse {
    let next = match req.query_string() {
        "" => req.path().to_owned(),
        query => format!("{}?{}", req.path(), query),
    };
    redirect(format!(
        "{}?next={}",
        LOGIN_URL,
        utf8_percent_encode(&next, NEXT_SET)
    ))
}

pub fn post_detail_url(post_id: Uuid) -> String {
    format!("/posts/{}/", post_id)
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", utf8_percent_encode(username, SEGMENT_SET))
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn location(resp: &HttpResponse) -> &str {
        resp.headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[test]
    fn profile_url_escapes_username() {
        assert_eq!(profile_url("hasNoName"), "/profile/hasNoName/");
        assert_eq!(profile_url("a.b+c@d"), "/profile/a.b+c@d/");
        assert_eq!(profile_url("a/b c"), "/profile/a%2Fb%20c/");
    }

    #[test]
    fn login_redirect_keeps_path_and_escapes_query() {
        let req = TestRequest::with_uri("/create/").to_http_request();
        assert_eq!(location(&redirect_to_login(&req)), "/auth/login/?next=/create/");

        let req = TestRequest::with_uri("/create/?page=2&x=y").to_http_request();
        assert_eq!(
            location(&redirect_to_login(&req)),
            "/auth/login/?next=/create/%3Fpage%3D2%26x%3Dy"
        );
    }
}
