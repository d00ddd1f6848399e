pub mod authentication;
pub mod roles;
pub mod session;
pub mod user;

pub use authentication::*;
pub use roles::*;
pub use session::*;
pub use user::*;
