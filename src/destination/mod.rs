//! Publishing side: note.com posts and image storage.

pub mod client;
pub mod model;
pub mod transport;

pub use client::NoteClient;
pub use model::{CreatedPost, PostDraft, PostStatus, PresignedPost, STORAGE_FIELD_ORDER};
pub use transport::{DestinationRequest, DestinationTransport, HttpDestinationTransport, RequestBody};
