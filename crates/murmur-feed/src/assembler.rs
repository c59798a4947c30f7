use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use murmur_types::api::{HistoryPage, ProfileView, UnreadCount};
use murmur_types::models::{AuthorProfile, Channel, ChannelSummary, Message, MessageView};
use murmur_types::{ChannelId, MessageId};

use crate::cache::CacheStore;
use crate::context::RequestContext;
use crate::count_cache::CountCache;
use crate::directory::ChannelDirectory;
use crate::error::FeedError;
use crate::read_tracker::{ReadMarkerPolicy, ReadTracker};
use crate::store::{FeedStore, RetainedRows};

/// Messages per history page.
pub const HISTORY_PAGE_SIZE: u32 = 20;

/// Upper bound on messages returned by one poll.
pub const POLL_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedConfig {
    pub read_marker_policy: ReadMarkerPolicy,
    pub retain_on_reset: RetainedRows,
}

/// Request-level operations over the message store, count cache, read
/// tracker and channel directory.
pub struct FeedAssembler {
    store: Arc<dyn FeedStore>,
    counts: CountCache,
    tracker: ReadTracker,
    directory: ChannelDirectory,
    retain_on_reset: RetainedRows,
}

impl FeedAssembler {
    pub fn new<S>(store: Arc<S>, cache: Arc<dyn CacheStore>, config: FeedConfig) -> Self
    where
        S: FeedStore + 'static,
    {
        Self {
            counts: CountCache::new(store.clone(), cache.clone()),
            tracker: ReadTracker::new(store.clone(), config.read_marker_policy),
            directory: ChannelDirectory::new(store.clone(), cache),
            store,
            retain_on_reset: config.retain_on_reset,
        }
    }

    pub fn counts(&self) -> &CountCache {
        &self.counts
    }

    pub fn tracker(&self) -> &ReadTracker {
        &self.tracker
    }

    pub fn directory(&self) -> &ChannelDirectory {
        &self.directory
    }

    // -- Messages --

    /// Append a message, then bump the channel's cached count.
    pub fn post_message(
        &self,
        ctx: &RequestContext,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, FeedError> {
        if content.trim().is_empty() {
            return Err(FeedError::EmptyContent);
        }
        self.directory.channel(channel_id)?;

        let message_id = self.store.append_message(channel_id, ctx.user_id, content)?;
        // Not atomic with the append: if this fails the cached count stays one short.
        // A concurrent reset or prime_counts that recounts between the append and this
        // increment counts the message twice; that one-over drift is accepted too.
        let cached = self.counts.on_message_appended(channel_id)?;

        debug!(
            channel_id,
            message_id,
            cached_count = cached,
            user = %ctx.username,
            "message posted"
        );
        Ok(message_id)
    }

    /// Messages newer than `since_id` (or the latest ones when `since_id <= 0`),
    /// oldest first. Advances the caller's read marker to the newest id returned.
    pub fn poll(
        &self,
        ctx: &RequestContext,
        channel_id: ChannelId,
        since_id: MessageId,
    ) -> Result<Vec<MessageView>, FeedError> {
        self.directory.channel(channel_id)?;

        let after = (since_id > 0).then_some(since_id);
        let rows = self.store.recent_messages(channel_id, after, POLL_LIMIT)?;
        let max_id = rows.iter().map(|m| m.id).max().unwrap_or(0);

        let views = self.render(rows)?;
        self.tracker.mark_read(ctx.user_id, channel_id, max_id)?;
        Ok(views)
    }

    /// One fixed-size page of history, oldest first within the page.
    /// Page 1 holds the newest messages.
    pub fn history_page(&self, channel_id: ChannelId, page: u32) -> Result<HistoryPage, FeedError> {
        self.directory.channel(channel_id)?;

        let total = self.counts.get_count(channel_id)?;
        let max_page = max_page(total);
        if page < 1 || page > max_page {
            return Err(FeedError::PageOutOfRange { page, max_page });
        }

        let offset = u64::from(page - 1) * u64::from(HISTORY_PAGE_SIZE);
        let rows = self.store.messages_page(channel_id, HISTORY_PAGE_SIZE, offset)?;
        let messages = self.render(rows)?;

        Ok(HistoryPage {
            messages,
            page,
            max_page,
        })
    }

    // -- Unread --

    /// Unread count for every channel, in directory order.
    pub fn unread_summary(&self, ctx: &RequestContext) -> Result<Vec<UnreadCount>, FeedError> {
        let markers = self.tracker.markers_for_user(ctx.user_id)?;

        self.directory
            .list_channels()?
            .into_iter()
            .map(|channel| {
                let unread = self.unread_since(channel.id, markers.get(&channel.id).copied())?;
                Ok(UnreadCount {
                    channel_id: channel.id,
                    unread,
                })
            })
            .collect::<Result<Vec<_>, FeedError>>()
    }

    pub fn unread(&self, ctx: &RequestContext, channel_id: ChannelId) -> Result<u64, FeedError> {
        self.directory.channel(channel_id)?;
        let marker = self.tracker.get_last_read(ctx.user_id, channel_id)?;
        self.unread_since(channel_id, marker)
    }

    fn unread_since(&self, channel_id: ChannelId, marker: Option<MessageId>) -> Result<u64, FeedError> {
        match marker {
            // A zero marker (written by an empty poll) counts as never opened.
            Some(last_read) if last_read > 0 => {
                Ok(self.store.count_messages_after(channel_id, last_read)?)
            }
            _ => self.counts.get_count(channel_id),
        }
    }

    // -- Channels --

    pub fn list_channels(&self) -> Result<Vec<ChannelSummary>, FeedError> {
        self.directory.list_channels()
    }

    pub fn channel(&self, channel_id: ChannelId) -> Result<Channel, FeedError> {
        self.directory.channel(channel_id)
    }

    /// Create a channel with its count seeded to zero, so a first post can
    /// never race a first read into a diverged counter.
    pub fn create_channel(&self, name: &str, description: &str) -> Result<Channel, FeedError> {
        let channel = self.directory.create_channel(name, description)?;
        self.counts.seed(channel.id, 0)?;
        Ok(channel)
    }

    // -- Profiles --

    /// Public profile of the user named `name`, flagged when it is the caller's own.
    pub fn profile(&self, ctx: &RequestContext, name: &str) -> Result<ProfileView, FeedError> {
        let (user_id, user) = self
            .store
            .author_by_name(name)?
            .ok_or_else(|| FeedError::UserNotFound(name.to_string()))?;

        Ok(ProfileView {
            user,
            self_profile: user_id == ctx.user_id,
        })
    }

    // -- Admin --

    /// Recount every channel from the store and overwrite its cached total.
    ///
    /// Must run before serving whenever the cache may have lost its contents
    /// (a fresh in-process cache over an existing database) so that a first
    /// post never increments a cold key. Returns the number of channels primed.
    pub fn prime_counts(&self) -> Result<usize, FeedError> {
        let channels = self.directory.list_channels()?;
        for channel in &channels {
            self.counts.refresh(channel.id)?;
        }
        Ok(channels.len())
    }

    /// Return the store to its baseline, flush the cache and re-prime the
    /// count of every surviving channel from the store.
    pub fn reset(&self) -> Result<(), FeedError> {
        self.store.reset(&self.retain_on_reset)?;
        self.counts.reset()?;
        let channels = self.prime_counts()?;

        info!(
            channels,
            keep_channels = self.retain_on_reset.channels,
            keep_messages = self.retain_on_reset.messages,
            "feed reset"
        );
        Ok(())
    }

    /// Attach author profiles and flip newest-first rows into chronological order.
    fn render(&self, rows: Vec<Message>) -> Result<Vec<MessageView>, FeedError> {
        let mut authors = AuthorMemo::new(self.store.as_ref());
        let mut views = rows
            .into_iter()
            .map(|message| {
                let user = authors.resolve(message.user_id)?;
                Ok(MessageView::new(message, user))
            })
            .collect::<Result<Vec<_>, FeedError>>()?;
        views.reverse();
        Ok(views)
    }
}

/// `max(1, ceil(total / HISTORY_PAGE_SIZE))`
pub fn max_page(total: u64) -> u32 {
    let pages = total.div_ceil(u64::from(HISTORY_PAGE_SIZE)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Author lookups memoized for the lifetime of one render.
struct AuthorMemo<'a> {
    store: &'a dyn FeedStore,
    seen: HashMap<Uuid, Option<AuthorProfile>>,
}

impl<'a> AuthorMemo<'a> {
    fn new(store: &'a dyn FeedStore) -> Self {
        Self {
            store,
            seen: HashMap::new(),
        }
    }

    fn resolve(&mut self, user_id: Uuid) -> Result<Option<AuthorProfile>, FeedError> {
        if let Some(profile) = self.seen.get(&user_id) {
            return Ok(profile.clone());
        }
        let profile = self.store.author_profile(user_id)?;
        self.seen.insert(user_id, profile.clone());
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::count_cache::count_key;
    use crate::directory::DIRECTORY_KEY;
    use crate::error::CacheError;
    use crate::store::{AuthorDirectory, ChannelStore, MessageStore};
    use crate::testing::{FakeStore, UnavailableCache};

    struct Harness {
        store: Arc<FakeStore>,
        cache: Arc<MemoryCache>,
        feed: FeedAssembler,
    }

    fn harness(policy: ReadMarkerPolicy) -> Harness {
        let store = Arc::new(FakeStore::with_channels(&["general", "random"]));
        let cache = Arc::new(MemoryCache::new());
        let feed = FeedAssembler::new(
            store.clone(),
            cache.clone(),
            FeedConfig {
                read_marker_policy: policy,
                ..FeedConfig::default()
            },
        );
        Harness { store, cache, feed }
    }

    fn user(name: &str) -> RequestContext {
        RequestContext::new(Uuid::new_v4(), name)
    }

    #[test]
    fn hello_scenario() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let poster = user("poster");
        let reader = user("reader");

        assert_eq!(h.feed.counts().get_count(1).unwrap(), 0);

        h.feed.post_message(&poster, 1, "hello").unwrap();
        assert_eq!(h.feed.counts().get_count(1).unwrap(), 1);

        // No marker yet: falls back to the cached total.
        assert_eq!(h.feed.unread(&reader, 1).unwrap(), 1);

        let polled = h.feed.poll(&reader, 1, 0).unwrap();
        assert_eq!(polled.len(), 1);
        assert_eq!(polled[0].content, "hello");
        let last = polled[0].id;
        assert_eq!(h.feed.tracker().get_last_read(reader.user_id, 1).unwrap(), Some(last));

        assert!(h.feed.poll(&reader, 1, last).unwrap().is_empty());
        assert_eq!(h.feed.unread(&reader, 1).unwrap(), 0);
    }

    #[test]
    fn unread_with_marker_is_exact_range_count() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let reader = user("reader");
        let ids = h.store.seed_messages(1, 6);

        h.feed.tracker().mark_read(reader.user_id, 1, ids[2]).unwrap();
        // Poison the cache: a marker-based count must not consult it.
        h.feed.counts().seed(1, 1000).unwrap();

        assert_eq!(h.feed.unread(&reader, 1).unwrap(), 3);
    }

    #[test]
    fn unread_without_marker_uses_cached_total() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let reader = user("reader");
        h.store.seed_messages(2, 4);
        h.feed.counts().seed(2, 9).unwrap();

        let summary = h.feed.unread_summary(&reader).unwrap();
        assert_eq!(
            summary,
            vec![
                UnreadCount { channel_id: 1, unread: 0 },
                UnreadCount { channel_id: 2, unread: 9 },
            ]
        );
    }

    #[test]
    fn zero_marker_falls_back_to_cached_total() {
        let h = harness(ReadMarkerPolicy::Overwrite);
        let reader = user("reader");

        // Empty poll writes a zero marker.
        assert!(h.feed.poll(&reader, 1, 0).unwrap().is_empty());
        assert_eq!(h.feed.tracker().get_last_read(reader.user_id, 1).unwrap(), Some(0));

        h.feed.post_message(&user("poster"), 1, "one").unwrap();
        h.feed.counts().seed(1, 5).unwrap();
        assert_eq!(h.feed.unread(&reader, 1).unwrap(), 5);
    }

    #[test]
    fn empty_poll_does_not_regress_monotonic_marker() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let reader = user("reader");
        let ids = h.store.seed_messages(1, 3);

        h.feed.poll(&reader, 1, 0).unwrap();
        assert_eq!(h.feed.tracker().get_last_read(reader.user_id, 1).unwrap(), Some(ids[2]));

        assert!(h.feed.poll(&reader, 1, ids[2]).unwrap().is_empty());
        assert_eq!(h.feed.tracker().get_last_read(reader.user_id, 1).unwrap(), Some(ids[2]));
    }

    #[test]
    fn empty_poll_overwrites_marker_under_baseline_policy() {
        let h = harness(ReadMarkerPolicy::Overwrite);
        let reader = user("reader");
        let ids = h.store.seed_messages(1, 3);

        h.feed.poll(&reader, 1, 0).unwrap();
        assert!(h.feed.poll(&reader, 1, ids[2]).unwrap().is_empty());
        assert_eq!(h.feed.tracker().get_last_read(reader.user_id, 1).unwrap(), Some(0));
    }

    #[test]
    fn poll_is_chronological_and_capped() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let reader = user("reader");
        let ids = h.store.seed_messages(1, 130);

        let polled = h.feed.poll(&reader, 1, 0).unwrap();
        assert_eq!(polled.len(), POLL_LIMIT as usize);
        assert_eq!(polled.first().unwrap().id, ids[30]);
        assert_eq!(polled.last().unwrap().id, ids[129]);
        assert!(polled.windows(2).all(|w| w[0].id < w[1].id));

        let newer = h.feed.poll(&reader, 1, ids[125]).unwrap();
        let newer_ids: Vec<_> = newer.iter().map(|m| m.id).collect();
        assert_eq!(newer_ids, ids[126..].to_vec());
    }

    #[test]
    fn poll_memoizes_author_lookups() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let alice = h.store.add_user("alice");
        let bob = h.store.add_user("bob");
        for i in 0..10 {
            let author = if i % 2 == 0 { alice } else { bob };
            h.store.append_message(1, author, &format!("m{}", i)).unwrap();
        }

        let polled = h.feed.poll(&user("reader"), 1, 0).unwrap();
        assert_eq!(h.store.author_calls(), 2);

        // Same output as looking every row up individually.
        for view in &polled {
            let expected = if view.content.trim_start_matches('m').parse::<u32>().unwrap() % 2 == 0 {
                h.store.author_profile(alice).unwrap()
            } else {
                h.store.author_profile(bob).unwrap()
            };
            assert_eq!(view.user, expected);
        }

        // Memo does not carry over to the next call.
        let before = h.store.author_calls();
        h.feed.poll(&user("reader"), 1, 0).unwrap();
        assert_eq!(h.store.author_calls(), before + 2);
    }

    #[test]
    fn unknown_author_renders_without_profile() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        h.store.append_message(1, Uuid::new_v4(), "ghost").unwrap();

        let polled = h.feed.poll(&user("reader"), 1, 0).unwrap();
        assert_eq!(polled[0].user, None);
    }

    #[test]
    fn twenty_messages_fit_one_page() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let ids = h.store.seed_messages(1, 20);

        let page = h.feed.history_page(1, 1).unwrap();
        assert_eq!(page.max_page, 1);
        let got: Vec<_> = page.messages.iter().map(|m| m.id).collect();
        assert_eq!(got, ids);

        assert!(matches!(
            h.feed.history_page(1, 2),
            Err(FeedError::PageOutOfRange { page: 2, max_page: 1 })
        ));
    }

    #[test]
    fn history_pages_walk_backwards_in_time() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let ids = h.store.seed_messages(1, 45);

        let first = h.feed.history_page(1, 1).unwrap();
        assert_eq!(first.max_page, 3);
        assert_eq!(first.messages.first().unwrap().id, ids[25]);
        assert_eq!(first.messages.last().unwrap().id, ids[44]);

        let last = h.feed.history_page(1, 3).unwrap();
        let got: Vec<_> = last.messages.iter().map(|m| m.id).collect();
        assert_eq!(got, ids[..5].to_vec());

        // Same page against unchanged data is identical.
        let again = h.feed.history_page(1, 3).unwrap();
        assert_eq!(again.messages, last.messages);
    }

    #[test]
    fn empty_channel_has_one_empty_page() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let page = h.feed.history_page(2, 1).unwrap();
        assert_eq!(page.max_page, 1);
        assert!(page.messages.is_empty());
        assert!(matches!(h.feed.history_page(2, 0), Err(FeedError::PageOutOfRange { .. })));
    }

    #[test]
    fn max_page_bounds() {
        assert_eq!(max_page(0), 1);
        assert_eq!(max_page(1), 1);
        assert_eq!(max_page(20), 1);
        assert_eq!(max_page(21), 2);
        assert_eq!(max_page(400), 20);
    }

    #[test]
    fn invalid_post_leaves_no_trace() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let poster = user("poster");

        assert!(matches!(h.feed.post_message(&poster, 1, "   "), Err(FeedError::EmptyContent)));
        assert!(matches!(h.feed.post_message(&poster, 0, "hi"), Err(FeedError::InvalidChannelId(0))));
        assert!(matches!(h.feed.post_message(&poster, 77, "hi"), Err(FeedError::ChannelNotFound(77))));

        assert_eq!(h.store.count_messages(1).unwrap(), 0);
        assert!(h.cache.is_empty());
    }

    #[test]
    fn created_channel_starts_counted() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        h.feed.list_channels().unwrap();

        let channel = h.feed.create_channel("dev", "tooling").unwrap();
        assert_eq!(h.cache.get(&count_key(channel.id)).unwrap().as_deref(), Some("0"));
        assert_eq!(h.cache.get(DIRECTORY_KEY).unwrap(), None);

        // First post before any read still agrees with the store.
        h.feed.post_message(&user("poster"), channel.id, "first").unwrap();
        assert_eq!(h.feed.counts().get_count(channel.id).unwrap(), 1);
        assert_eq!(h.store.count_messages(channel.id).unwrap(), 1);
        assert_eq!(h.feed.list_channels().unwrap().len(), 3);
    }

    #[test]
    fn reset_restores_baseline_and_reprimes_counts() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let reader = user("reader");
        h.store.seed_messages(1, 5);
        h.feed.create_channel("dev", "tooling").unwrap();
        h.feed.poll(&reader, 1, 0).unwrap();

        let feed = FeedAssembler::new(
            h.store.clone(),
            h.cache.clone(),
            FeedConfig {
                retain_on_reset: RetainedRows { channels: 1, messages: 2 },
                ..FeedConfig::default()
            },
        );
        feed.reset().unwrap();

        assert_eq!(h.store.list_channels().unwrap().len(), 1);
        assert_eq!(h.store.count_messages(1).unwrap(), 2);
        assert!(h.feed.tracker().markers_for_user(reader.user_id).unwrap().is_empty());

        // Counts are exact right away, without a store round-trip.
        let calls = h.store.count_calls();
        assert_eq!(feed.counts().get_count(1).unwrap(), 2);
        assert_eq!(h.store.count_calls(), calls);
    }

    #[test]
    fn priming_a_fresh_cache_keeps_first_post_exact() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        h.store.seed_messages(1, 5);
        h.store.seed_messages(2, 2);

        // Same store, empty cache: what a process restart looks like.
        let feed = FeedAssembler::new(h.store.clone(), Arc::new(MemoryCache::new()), FeedConfig::default());
        assert_eq!(feed.prime_counts().unwrap(), 2);

        feed.post_message(&user("poster"), 1, "after restart").unwrap();
        assert_eq!(feed.counts().get_count(1).unwrap(), 6);
        assert_eq!(feed.counts().get_count(2).unwrap(), 2);
        assert_eq!(feed.unread(&user("newcomer"), 1).unwrap(), 6);
    }

    #[test]
    fn profile_lookup_by_name() {
        let h = harness(ReadMarkerPolicy::Monotonic);
        let alice_id = h.store.add_user("alice");
        h.store.add_user("bob");
        let alice = RequestContext::new(alice_id, "alice");

        let own = h.feed.profile(&alice, "alice").unwrap();
        assert!(own.self_profile);
        assert_eq!(own.user.display_name, "ALICE");

        let other = h.feed.profile(&alice, "bob").unwrap();
        assert!(!other.self_profile);
        assert_eq!(other.user.name, "bob");

        assert!(matches!(
            h.feed.profile(&alice, "carol"),
            Err(FeedError::UserNotFound(name)) if name == "carol"
        ));
    }

    #[test]
    fn cache_outage_fails_the_request() {
        let store = Arc::new(FakeStore::with_channels(&["general"]));
        let feed = FeedAssembler::new(store.clone(), Arc::new(UnavailableCache), FeedConfig::default());

        let err = feed.post_message(&user("poster"), 1, "hi").unwrap_err();
        assert!(matches!(err, FeedError::Cache(CacheError::Unavailable(_))));
        // The append already happened; the count gap is accepted, not repaired.
        assert_eq!(store.count_messages(1).unwrap(), 1);
    }
}
