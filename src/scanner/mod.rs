mod alignment;
mod session;
mod stability;

pub use session::{spawn_session, ScanState};
