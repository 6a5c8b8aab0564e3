mod host;
mod queue;
mod request;

pub use host::ToastHost;
pub use queue::{ToastPhase, ToastQueue};
pub use request::{ToastKind, ToastRequest};
