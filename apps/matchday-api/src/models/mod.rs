pub mod friendship;
pub mod notification;
pub mod user;
pub mod user_match;
