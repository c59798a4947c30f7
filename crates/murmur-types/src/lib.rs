pub mod api;
pub mod models;

/// Channel identifiers are assigned by the store and are always positive.
pub type ChannelId = i64;

/// Message identifiers increase strictly across the whole system.
pub type MessageId = i64;
