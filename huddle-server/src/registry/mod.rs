mod member_outbox;
mod session;
mod session_command;
mod session_manager;

pub use member_outbox::*;
pub use session::*;
pub use session_command::*;
pub use session_manager::*;
