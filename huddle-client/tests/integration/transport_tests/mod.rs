pub mod test_offer_retry;
pub mod test_session_terminal_replies;
