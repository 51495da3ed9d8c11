pub mod app;
pub mod config;
pub mod frame;
pub mod logging;
pub mod ports;
pub mod transport;
