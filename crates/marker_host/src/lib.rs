//! Native messaging host running the background status service outside the
//! browser.
mod platform;

pub use platform::app::{run, HostApp, Stores};
pub use platform::config::{
    config_path, load_config, HostConfig, LogDestination, LogLevel, DEFAULT_CONFIG_PATH,
};
pub use platform::frame::{
    read_frame, write_frame, FrameError, Inbound, Outbound, Reply, MAX_FRAME_LEN,
};
pub use platform::logging::initialize as initialize_logging;
pub use platform::ports::{FrameCompanion, FrameTabMessenger};
pub use platform::transport::Transport;
