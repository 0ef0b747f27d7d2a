pub mod backend;
pub mod errors;
pub mod local;

pub use backend::{payload_from_slice, AppBackend, Payload};
pub use errors::AppError;
pub use local::AppLocal;
