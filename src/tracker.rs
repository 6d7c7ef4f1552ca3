//! Request tracking: state snapshots, observer dispatch, request factories,
//! the stall timer, and the `RequestTracker` that ties them together.

pub mod handlers;
pub mod invocation;
pub mod request;
mod stall;
pub mod state;

pub use handlers::{HandlerKind, StateCallback, TrackerHandlers};
pub use invocation::RequestTracker;
pub use request::{request_fn, Payload, RequestFn, RequestFuture};
pub use state::{Transition, TrackerState};
