//! Sessions, the log-in and registration pages, and the middleware that
//! guards every other page.

mod log_in;
mod log_out;
mod middleware;
mod register;
mod session;

pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use register::{get_register_page, register_user};
pub use session::{DEFAULT_SESSION_DURATION, Session};

#[cfg(test)]
pub use middleware::AuthState;
