pub mod calendar;
pub mod cli;
pub mod config;
pub mod extract;
pub mod protocol;
pub mod schedule;

use env_logger::Env;

pub fn init_logger() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use chrono::Local;
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

// Re-export commonly used types
pub use calendar::{CalendarError, CalendarSink, ProtocolEvent};
pub use config::Config;
pub use protocol::ProtocolEntry;
