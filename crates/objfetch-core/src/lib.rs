pub mod config;
pub mod error;
pub mod location;
pub mod logging;
pub mod store;
pub mod stream;

mod transport;
