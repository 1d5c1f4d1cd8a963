mod ws_handler;
mod ws_outbox;

pub use ws_handler::*;
pub use ws_outbox::*;
