use axum::http::{HeaderMap, Method, Request, Uri, request::Parts};
use chrono::{DateTime, Utc};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Snapshot of the request currently being handled.
///
/// Response factories receive it alongside the exception. It is never mutated
/// by the exception handler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    received_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method,
            uri,
            headers: HeaderMap::new(),
            received_at: Utc::now(),
        }
    }

    /// Capture a request's method, URI and headers.
    ///
    /// A valid UUID in `x-request-id` is kept as the request id; otherwise a new one is generated.
    pub fn from_parts(parts: &Parts) -> Self {
        Self::capture(&parts.method, &parts.uri, &parts.headers)
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::capture(request.method(), request.uri(), request.headers())
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    fn capture(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .unwrap_or_else(Uuid::new_v4);

        Self {
            request_id,
            method: method.clone(),
            uri: uri.clone(),
            headers: headers.clone(),
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_captures_request_line_and_headers() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/orders?draft=true")
            .header("accept", "application/json")
            .body(Body::empty())
            .unwrap();

        let context = RequestContext::from_request(&request);

        assert_eq!(context.method(), Method::POST);
        assert_eq!(context.uri().path(), "/orders");
        assert_eq!(context.headers()["accept"], "application/json");
    }

    #[test]
    fn test_keeps_incoming_request_id() {
        let id = Uuid::new_v4();
        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, id.to_string())
            .body(())
            .unwrap();

        assert_eq!(RequestContext::from_request(&request).request_id(), id);
    }

    #[test]
    fn test_generates_request_id_for_malformed_header() {
        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "not-a-uuid")
            .body(())
            .unwrap();

        let first = RequestContext::from_request(&request);
        let second = RequestContext::from_request(&request);
        assert_ne!(first.request_id(), second.request_id());
    }
}
