pub mod email_relay;

pub use email_relay::{EmailMessage, EmailRelayClient};
