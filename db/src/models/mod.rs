pub mod auth_token;
pub mod event;
pub mod typed_ulid;
pub mod user;

pub use auth_token::*;
pub use event::*;
pub use typed_ulid::*;
pub use user::*;
