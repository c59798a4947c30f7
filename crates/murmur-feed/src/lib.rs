//! Read tracking and cache-aside message counts for murmur channels.
//!
//! The [`FeedAssembler`] is the entry point: it appends messages, serves
//! incremental polls and history pages, and computes per-channel unread
//! counts from the [`ReadTracker`] and the [`CountCache`]. Storage and cache
//! backends are injected through the traits in [`store`] and [`cache`].

pub mod assembler;
pub mod cache;
pub mod context;
pub mod count_cache;
pub mod directory;
pub mod error;
pub mod read_tracker;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use assembler::{FeedAssembler, FeedConfig, HISTORY_PAGE_SIZE, POLL_LIMIT};
pub use cache::{CacheStore, MemoryCache};
pub use context::RequestContext;
pub use count_cache::CountCache;
pub use directory::ChannelDirectory;
pub use error::{CacheError, FeedError};
pub use read_tracker::{ReadMarkerPolicy, ReadTracker};
pub use store::{
    AdminStore, AuthorDirectory, ChannelStore, FeedStore, MessageStore, ReadMarkerStore,
    RetainedRows,
};
