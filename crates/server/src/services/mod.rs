//! External service clients.

pub mod email;
pub mod push;
pub mod webpush;

pub use email::EmailClient;
pub use push::PushClient;
