use axum::response::Response;
use std::sync::{Arc, Mutex, PoisonError};

/// Transmits the response produced for an exception.
///
/// Calls are synchronous from the handler's point of view.
pub trait ResponseWriter: Send + Sync {
    fn write_response(&self, response: Response);
}

impl<F> ResponseWriter for F
where
    F: Fn(Response) + Send + Sync,
{
    fn write_response(&self, response: Response) {
        self(response)
    }
}

/// A writer that holds on to the last written response until it is taken.
///
/// The request middleware uses one slot per request to collect the handler's
/// response and send it back through the service stack.
#[derive(Clone, Default)]
pub struct ResponseSlot {
    response: Arc<Mutex<Option<Response>>>,
}

impl ResponseSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Option<Response> {
        self.response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl ResponseWriter for ResponseSlot {
    fn write_response(&self, response: Response) {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner) = Some(response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_slot_keeps_last_response() {
        let slot = ResponseSlot::new();
        let writer: &dyn ResponseWriter = &slot;

        writer.write_response(StatusCode::CONFLICT.into_response());
        writer.write_response(StatusCode::GONE.into_response());

        assert_eq!(slot.take().unwrap().status(), StatusCode::GONE);
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_closures_are_writers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let writer = move |response: Response| sink.lock().unwrap().push(response.status());

        writer.write_response(StatusCode::ACCEPTED.into_response());

        assert_eq!(*seen.lock().unwrap(), vec![StatusCode::ACCEPTED]);
    }
}
