pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod kv;
pub mod models;
pub mod policy;
pub mod query;
pub mod remote;
pub mod sync;
pub mod tags;

mod file_store;
mod memory;
pub use file_store::FileStore;
pub use memory::MemoryStore;

pub use cache::LocalCache;
pub use config::WorkspaceConfig;
pub use error::{RemoteError, RemoteResult, SaveError, StoreError, StoreResult, TagError};
pub use export::{export_to_file, format_notes_as_text};
pub use kv::KeyValueStore;
pub use models::{
    Account, AccountPatch, CustomTag, Folder, Identity, Note, Profile, SharedNote, Theme, GUEST,
};
pub use policy::{ReadSource, ReconciliationPolicy, RemoteRead, RemoteWhenNonEmpty};
pub use query::{NoteQuery, SortMode};
pub use remote::{
    MemoryRemote, NewSharedNote, OfflineRemote, RemoteFolder, RemoteNote, RemoteStore, Session,
};
pub use sync::{LoadedNotes, MirrorStatus, NoteSync};
