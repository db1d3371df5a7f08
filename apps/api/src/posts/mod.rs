// Persistence of users, clients and generated posts, plus their handlers.

pub mod handlers;
pub mod store;
