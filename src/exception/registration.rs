use crate::exception::ExceptionHandler;
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::thread;

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// An installed process-wide exception handler.
///
/// Returned by [`ExceptionHandler::register`]. While alive, panics are routed to the
/// handler. Dropping it reinstalls the hook that was active before registration.
#[must_use = "dropping the registration immediately restores the previous panic hook"]
pub struct HandlerRegistration {
    previous: Option<PanicHook>,
}

impl HandlerRegistration {
    pub(crate) fn install(handler: Arc<ExceptionHandler>) -> Self {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| handler.handle_panic(info)));
        tracing::debug!("Exception handler registered as panic hook");

        Self {
            previous: Some(previous),
        }
    }
}

impl Drop for HandlerRegistration {
    fn drop(&mut self) {
        // The hook cannot be swapped from a panicking thread.
        if thread::panicking() {
            return;
        }

        if let Some(previous) = self.previous.take() {
            panic::set_hook(previous);
            tracing::debug!("Previous panic hook restored");
        }
    }
}
