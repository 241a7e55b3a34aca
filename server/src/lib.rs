pub mod acl;
pub mod config;
pub mod engine;
pub mod roster;
pub mod server;

mod handlers;
mod http_types;
mod kratos;
mod server_state;
mod validation;
