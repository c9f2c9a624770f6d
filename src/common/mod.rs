pub mod context;
pub mod response;
pub mod writer;

pub use context::RequestContext;
pub use response::ErrorBody;
pub use writer::{ResponseSlot, ResponseWriter};
