pub mod client;
pub mod post;
pub mod user;
