//! User registration, log-in and cookie based sessions.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod register_user;
mod token;
mod user;

pub(crate) use cookie::DEFAULT_COOKIE_DURATION;
pub use log_in::post_log_in;
pub use log_out::post_log_out;
pub(crate) use middleware::deserialize_user_id;
pub use middleware::{UserQuery, auth_guard, authorize_user};
pub use password::PasswordHash;
pub use register_user::register_user;
pub use user::{
    NewUser, User, UserID, count_users, create_user, create_user_table, delete_user,
    get_user_by_email, get_user_by_id,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
