//! Alert notification delivery: placeholder templating, per-channel
//! senders and the dispatcher orchestrating them.

pub mod dispatcher;
pub mod senders;
pub mod template;

pub use dispatcher::{AlertDispatcher, DispatchError, DispatchOutcome, DispatchRequest};
pub use senders::{ChannelOutcome, SenderError};
pub use template::TemplateContext;
