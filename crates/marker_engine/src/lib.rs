//! Marker engine: ports to the browser, the per-tab thumbnail status driver
//! and panel, and the background synchronization service.
mod client;
mod companion;
mod extract;
mod filename;
mod local;
mod memory;
mod persist;
mod ports;
mod settings;
mod sync;
mod tab_registry;
mod thumbnail_panel;
mod thumbnail_status;
mod types;

pub use client::BackgroundClient;
pub use companion::CompanionClient;
pub use extract::{ExtractError, IdentifierExtractor};
pub use filename::storage_filename;
pub use local::LocalBackground;
pub use memory::MemoryStore;
pub use persist::{ensure_storage_dir, AtomicFileWriter, JsonFileStore, PersistError};
pub use ports::{
    AnchorProbe, CompanionPort, KeyValueStore, MessagePort, Page, PageEvent, TabMessenger,
};
pub use settings::SettingsManager;
pub use sync::{FanOutReport, PublishReport, StatusSync, SyncPorts, TabChange};
pub use tab_registry::TabRegistry;
pub use thumbnail_panel::{Modifiers, PanelLink, PanelView, ThumbnailPanel, CLASS_SHOWING_PANEL};
pub use thumbnail_status::{ManagedContainer, ThumbnailStatus};
pub use types::{
    BackgroundError, CompanionError, PanelError, StorageError, TabId, TransportError,
};
