//! Session access and session-refreshing retries

pub mod ports;
pub mod retry;

pub use ports::{SessionProvider, NO_GENERATION};
pub use retry::SessionRetryPolicy;
