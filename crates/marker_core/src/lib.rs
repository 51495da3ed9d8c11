//! Marker core: data model, status store, link registry and the pure
//! thumbnail tracker state machine.
mod aggregate;
mod companion;
mod effect;
mod host_maps;
mod message;
mod msg;
mod post_url;
mod registry;
mod settings;
mod state;
mod types;
mod update;
mod view_model;

pub use aggregate::{
    AggregateStatus, MarkerFlags, CLASS_CHECKED_MIXED, CLASS_CHECKED_NOT_UPLOADED,
    CLASS_CHECKED_UPLOADED, CLASS_HANDLED, CLASS_LARGE, CLASS_PARTIALLY_CHECKED, STATUS_CLASSES,
};
pub use companion::{
    ArtistDatabaseResponse, ArtistEntry, CompanionRequest, HostPost, QueryHostResponse, RawPostId,
};
pub use effect::Effect;
pub use host_maps::{merge_post_ids, HostMaps};
pub use message::{
    ArtistPostsSummary, ErrorCode, ErrorReply, FindPostsByArtistArgs, GetPostStatusArgs, Message,
    SettingsChangedArgs,
};
pub use msg::{Msg, ResolvedLink};
pub use post_url::{parse_post_url, source_id_from_url, PostUrlError};
pub use registry::{ContainerId, ElementId, LinkRegistry};
pub use settings::{DefaultHost, SettingKey, Settings};
pub use state::TrackerState;
pub use types::{
    BooruPost, PostHost, PostId, PostsMap, SourceHost, SourceId, StatusMap, StatusUpdate,
    ThumbnailSize, UnknownHost, UploadStatus,
};
pub use update::update;
pub use view_model::TrackerView;
