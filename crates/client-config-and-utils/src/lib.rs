//! Configuration, filesystem layout and logging setup for the coupon client.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_COUNTER_FUNCTION, DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_LOG_LEVEL,
    DEFAULT_MIN_FEEDBACK_DELAY_MS, DEFAULT_SUPABASE_PUBLISHABLE_KEY, DEFAULT_SUPABASE_URL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
