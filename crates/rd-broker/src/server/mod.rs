//! TCP server for client connections

mod handler;
mod listener;

pub use handler::handle_connection;
pub use listener::BrokerServer;
