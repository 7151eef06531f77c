// Session module - scripted exchanges driven through the blocking client
pub mod driver;
pub mod report;

pub use driver::{run_session, send_once, DriverOptions};
pub use report::{Exchange, SessionReport};
