use thiserror::Error;

use murmur_types::ChannelId;

/// Failures raised by a [`crate::CacheStore`] backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache value at `{key}` is not an integer")]
    NotAnInteger { key: String },

    #[error("cache entry `{key}` could not be decoded: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("message content is empty")]
    EmptyContent,

    #[error("invalid channel id {0}")]
    InvalidChannelId(ChannelId),

    #[error("channel {0} must not be empty")]
    EmptyChannelField(&'static str),

    #[error("channel {0} not found")]
    ChannelNotFound(ChannelId),

    #[error("user `{0}` not found")]
    UserNotFound(String),

    #[error("page {page} out of range (max {max_page})")]
    PageOutOfRange { page: u32, max_page: u32 },

    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl FeedError {
    /// True when the addressed channel or user does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ChannelNotFound(_) | Self::UserNotFound(_))
    }

    /// True for errors caused by the caller's input rather than by a backend.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::EmptyContent
                | Self::InvalidChannelId(_)
                | Self::EmptyChannelField(_)
                | Self::PageOutOfRange { .. }
        )
    }
}
