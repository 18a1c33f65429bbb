//! Application services for notification fan-out.

mod bus;
mod dispatcher;

pub use bus::{ChannelOutcome, DispatchReport, NotificationBus};
pub use dispatcher::{DispatchError, DispatchResult, Dispatcher};
