pub mod event;
pub mod mapping;
pub mod raw;
pub mod timestamp;

pub use event::{PlayEvent, Provider, END_REASON_TRACK_DONE, END_REASON_UNKNOWN};
pub use mapping::{ArtistMapping, MappingReportEntry};
pub use raw::{AppleMusicRow, SpotifyRecord};
