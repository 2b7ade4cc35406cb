use crate::error::{ResolveError, Result};
use crate::resolver::Resolver;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use std::sync::Arc;
use tether_cache::ExpiringCache;
use tether_core::{
    Clock, LinkRecord, NewLink, ReadRepository, Repository, ShortCode, StorageError, SystemClock,
    UrlCache,
};
use tether_generator::Generator;
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

/// Upper bound on generated candidates tried for a single link.
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 5;

/// Immutable settings for [`ResolutionService`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ResolverConfig {
    /// Lifetime given to links created without an explicit duration.
    #[builder(default = SignedDuration::from_hours(24))]
    pub default_expiration: SignedDuration,
    /// Total number of generated codes tried before giving up.
    #[builder(default = DEFAULT_MAX_GENERATION_ATTEMPTS)]
    pub max_generation_attempts: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Parameters for [`ResolutionService::create_link`].
///
/// Inputs are assumed to be validated already; the service only enforces
/// uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct CreateLink {
    #[builder(setter(into))]
    pub original_url: String,
    /// Caller-chosen code. When absent a code is generated.
    #[builder(default, setter(strip_option))]
    pub custom_code: Option<ShortCode>,
    /// Lifetime in hours. When absent the configured default applies.
    #[builder(default, setter(strip_option))]
    pub duration_hours: Option<u32>,
}

/// Creates, resolves and purges links.
///
/// The durable store is written first and is authoritative; the cache is
/// populated only after a successful store write and is consulted first on
/// reads. Every liveness decision reads time from the same [`Clock`].
pub struct ResolutionService<R, C, G> {
    config: ResolverConfig,
    repository: Arc<R>,
    cache: Arc<ExpiringCache<C>>,
    generator: Arc<G>,
    clock: Arc<dyn Clock>,
}

impl<R, C, G> Clone for ResolutionService<R, C, G> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            repository: Arc::clone(&self.repository),
            cache: Arc::clone(&self.cache),
            generator: Arc::clone(&self.generator),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C: std::fmt::Debug, G> std::fmt::Debug for ResolutionService<R, C, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionService")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<R: Repository, C: UrlCache, G: Generator> ResolutionService<R, C, G> {
    /// Creates a service that reads time from the system clock.
    ///
    /// # Arguments
    ///
    /// * `config` - Default lifetime and generation bound
    /// * `repository` - The durable store, authoritative for every link
    /// * `cache` - Raw cache backend; wrapped in an [`ExpiringCache`]
    /// * `generator` - Source of candidate codes for links without a custom one
    pub fn new(config: ResolverConfig, repository: R, cache: C, generator: G) -> Self {
        Self::with_clock(config, repository, cache, generator, SystemClock)
    }

    /// Creates a service whose liveness checks, cache TTLs and cleanup
    /// cutoff all read time from `clock`.
    pub fn with_clock(
        config: ResolverConfig,
        repository: R,
        cache: C,
        generator: G,
        clock: impl Clock,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        Self {
            config,
            repository: Arc::new(repository),
            cache: Arc::new(ExpiringCache::with_clock(cache, Arc::clone(&clock))),
            generator: Arc::new(generator),
            clock,
        }
    }

    /// The settings this service was built with.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Allocates a code for `request.original_url`, persists the link and
    /// then caches it.
    ///
    /// A cache failure after the durable write is returned as
    /// [`ResolveError::Cache`]; the link stays persisted and later lookups
    /// fall through to the store.
    pub async fn create_link(&self, request: CreateLink) -> Result<LinkRecord> {
        let CreateLink {
            original_url,
            custom_code,
            duration_hours,
        } = request;
        let expires_at = self.expires_at(duration_hours)?;

        let record = match custom_code {
            Some(code) => self.create_custom(code, original_url, expires_at).await?,
            None => self.create_generated(original_url, expires_at).await?,
        };

        self.cache
            .cache_link(&record)
            .await
            .map_err(ResolveError::cache("cache_link", &record.code))?;

        info!(
            code = %record.code,
            expires_at = %record.expires_at,
            is_custom = record.is_custom,
            "Created link"
        );
        Ok(record)
    }

    /// Resolves `code` to its live link.
    ///
    /// Returns `Ok(None)` when no live link exists, whichever layer was
    /// consulted.
    pub async fn get_link(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        trace!(code = %code, "Resolving short code");

        let cached = self
            .cache
            .get_url(code)
            .await
            .map_err(ResolveError::cache("get_url", code))?;

        let record = match cached {
            Some(record) => {
                debug!(code = %code, "Served from cache");
                record
            }
            None => {
                let stored = self
                    .repository
                    .get_by_code(code)
                    .await
                    .map_err(ResolveError::storage("get_by_code", Some(code)))?;
                let Some(record) = stored else {
                    trace!(code = %code, "Short code not found");
                    return Ok(None);
                };

                if let Err(e) = self.cache.cache_link(&record).await {
                    warn!(code = %code, error = %e, "Read-repair into cache failed");
                }
                record
            }
        };

        if !record.is_live_at(self.clock.now()) {
            debug!(code = %code, expires_at = %record.expires_at, "Link has expired");
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Purges every stored link that expired before now and returns how many
    /// were removed. The cache is left alone; its entries expire on their own.
    pub async fn cleanup(&self) -> Result<u64> {
        let cutoff = self.clock.now();
        let deleted = self
            .repository
            .delete_expired(cutoff)
            .await
            .map_err(ResolveError::storage("delete_expired", None))?;
        debug!(deleted, cutoff = %cutoff, "Purged expired links");
        Ok(deleted)
    }

    fn expires_at(&self, duration_hours: Option<u32>) -> Result<Timestamp> {
        let lifetime = match duration_hours {
            Some(hours) => SignedDuration::from_hours(i64::from(hours)),
            None => self.config.default_expiration,
        };
        self.clock
            .now()
            .checked_add(lifetime)
            .map_err(|e| ResolveError::InvalidExpiration(e.to_string()))
    }

    async fn create_custom(
        &self,
        code: ShortCode,
        original_url: String,
        expires_at: Timestamp,
    ) -> Result<LinkRecord> {
        let available = self
            .repository
            .is_code_available(&code)
            .await
            .map_err(ResolveError::storage("is_code_available", Some(&code)))?;
        if !available {
            debug!(code = %code, "Custom code is taken");
            return Err(ResolveError::Conflict(code));
        }

        let link = NewLink {
            code: code.clone(),
            original_url,
            expires_at,
            is_custom: true,
        };
        match self.repository.create_link(link).await {
            Ok(record) => Ok(record),
            Err(StorageError::Conflict(_)) => {
                debug!(code = %code, "Lost race for custom code");
                Err(ResolveError::Conflict(code))
            }
            Err(source) => Err(ResolveError::storage("create_link", Some(&code))(source)),
        }
    }

    async fn create_generated(
        &self,
        original_url: String,
        expires_at: Timestamp,
    ) -> Result<LinkRecord> {
        let attempts = self.config.max_generation_attempts;

        for attempt in 1..=attempts {
            let code: ShortCode = self.generator.generate().into();

            let available = self
                .repository
                .is_code_available(&code)
                .await
                .map_err(ResolveError::storage("is_code_available", Some(&code)))?;
            if !available {
                debug!(code = %code, attempt, "Generated code collides with an existing link");
                continue;
            }

            let link = NewLink {
                code: code.clone(),
                original_url: original_url.clone(),
                expires_at,
                is_custom: false,
            };
            match self.repository.create_link(link).await {
                Ok(record) => return Ok(record),
                Err(StorageError::Conflict(_)) => {
                    debug!(code = %code, attempt, "Generated code was taken concurrently");
                }
                Err(source) => {
                    return Err(ResolveError::storage("create_link", Some(&code))(source));
                }
            }
        }

        warn!(attempts, "Exhausted short code generation attempts");
        Err(ResolveError::GenerationExhausted { attempts })
    }
}

#[async_trait]
impl<R: Repository, C: UrlCache, G: Generator> Resolver for ResolutionService<R, C, G> {
    async fn create_link(&self, request: CreateLink) -> Result<LinkRecord> {
        ResolutionService::create_link(self, request).await
    }

    async fn get_link(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        ResolutionService::get_link(self, code).await
    }

    async fn cleanup(&self) -> Result<u64> {
        ResolutionService::cleanup(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tether_cache::MokaUrlCache;
    use tether_core::{CacheError, ManualClock};
    use tether_generator::{GeneratorConfig, RandomGenerator, SeqGenerator, ALPHABET};
    use tether_storage::InMemoryRepository;

    /// Emits a fixed script of codes, repeating the last one forever, and
    /// counts how often it was asked.
    struct ScriptedGenerator {
        script: Mutex<VecDeque<&'static str>>,
        last: &'static str,
        calls: Arc<AtomicU32>,
    }

    impl ScriptedGenerator {
        fn new(script: &[&'static str]) -> (Self, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            let generator = Self {
                script: Mutex::new(script.iter().copied().collect()),
                last: script[script.len() - 1],
                calls: Arc::clone(&calls),
            };
            (generator, calls)
        }
    }

    impl Generator for ScriptedGenerator {
        type Output = ShortCode;

        fn generate(&self) -> ShortCode {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            let code = next.unwrap_or(self.last);
            ShortCode::new_unchecked(code)
        }
    }

    /// Reads as empty and rejects every write.
    #[derive(Debug, Default)]
    struct BrokenCache {
        writes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl UrlCache for BrokenCache {
        async fn get_url(&self, _code: &ShortCode) -> tether_core::cache::Result<Option<LinkRecord>> {
            Ok(None)
        }

        async fn set_url(
            &self,
            _code: &ShortCode,
            _record: &LinkRecord,
            _ttl: Duration,
        ) -> tether_core::cache::Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Unavailable("cache is down".to_string()))
        }

        async fn del(&self, _code: &ShortCode) -> tether_core::cache::Result<()> {
            Err(CacheError::Unavailable("cache is down".to_string()))
        }
    }

    /// Reports every code as available but rejects the first `conflicts`
    /// inserts, as if another writer got there first.
    struct RacingRepository {
        inner: InMemoryRepository,
        conflicts: AtomicU32,
    }

    #[async_trait]
    impl ReadRepository for RacingRepository {
        async fn is_code_available(&self, _code: &ShortCode) -> tether_core::repository::Result<bool> {
            Ok(true)
        }

        async fn get_by_code(
            &self,
            code: &ShortCode,
        ) -> tether_core::repository::Result<Option<LinkRecord>> {
            self.inner.get_by_code(code).await
        }
    }

    #[async_trait]
    impl Repository for RacingRepository {
        async fn create_link(&self, link: NewLink) -> tether_core::repository::Result<LinkRecord> {
            let remaining = self.conflicts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.conflicts.store(remaining - 1, Ordering::SeqCst);
                return Err(StorageError::Conflict(link.code.to_string()));
            }
            self.inner.create_link(link).await
        }

        async fn delete_expired(&self, cutoff: Timestamp) -> tether_core::repository::Result<u64> {
            self.inner.delete_expired(cutoff).await
        }
    }

    /// A cache backend that cannot be reached at all.
    #[derive(Debug)]
    struct UnreachableCache;

    #[async_trait]
    impl UrlCache for UnreachableCache {
        async fn get_url(&self, _code: &ShortCode) -> tether_core::cache::Result<Option<LinkRecord>> {
            Err(CacheError::Unavailable("redis down".to_string()))
        }

        async fn set_url(
            &self,
            _code: &ShortCode,
            _record: &LinkRecord,
            _ttl: Duration,
        ) -> tether_core::cache::Result<()> {
            Err(CacheError::Unavailable("redis down".to_string()))
        }

        async fn del(&self, _code: &ShortCode) -> tether_core::cache::Result<()> {
            Err(CacheError::Unavailable("redis down".to_string()))
        }
    }

    /// A store that cannot be reached at all.
    struct UnreachableRepository;

    #[async_trait]
    impl ReadRepository for UnreachableRepository {
        async fn is_code_available(&self, _code: &ShortCode) -> tether_core::repository::Result<bool> {
            Err(StorageError::Unavailable("db down".to_string()))
        }

        async fn get_by_code(
            &self,
            _code: &ShortCode,
        ) -> tether_core::repository::Result<Option<LinkRecord>> {
            Err(StorageError::Unavailable("db down".to_string()))
        }
    }

    #[async_trait]
    impl Repository for UnreachableRepository {
        async fn create_link(&self, _link: NewLink) -> tether_core::repository::Result<LinkRecord> {
            Err(StorageError::Unavailable("db down".to_string()))
        }

        async fn delete_expired(&self, _cutoff: Timestamp) -> tether_core::repository::Result<u64> {
            Err(StorageError::Unavailable("db down".to_string()))
        }
    }

    fn base() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn url(original_url: &str) -> CreateLink {
        CreateLink::builder().original_url(original_url).build()
    }

    type TestService<G> = ResolutionService<InMemoryRepository, MokaUrlCache, G>;

    struct Harness<G> {
        service: TestService<G>,
        repo: InMemoryRepository,
        cache: MokaUrlCache,
        clock: ManualClock,
    }

    fn harness<G: Generator>(generator: G) -> Harness<G> {
        let clock = ManualClock::new(base());
        let repo = InMemoryRepository::with_clock(clock.clone());
        let cache = MokaUrlCache::new();
        let service = ResolutionService::with_clock(
            ResolverConfig::default(),
            repo.clone(),
            cache.clone(),
            generator,
            clock.clone(),
        );
        Harness {
            service,
            repo,
            cache,
            clock,
        }
    }

    fn random_harness() -> Harness<RandomGenerator> {
        harness(RandomGenerator::new(GeneratorConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn create_generates_code_and_applies_default_expiration() {
        let h = random_harness();

        let record = h.service.create_link(url("https://example.com/a")).await.unwrap();

        assert_eq!(record.code.as_str().len(), 6);
        assert!(record.code.as_str().bytes().all(|b| ALPHABET.contains(&b)));
        assert!(!record.is_custom);
        assert_eq!(record.original_url, "https://example.com/a");
        assert_eq!(record.expires_at, base() + SignedDuration::from_hours(24));
        assert_eq!(record.created_at, base());
    }

    #[tokio::test]
    async fn create_then_get_returns_same_url() {
        let h = random_harness();

        let record = h
            .service
            .create_link(
                CreateLink::builder()
                    .original_url("https://example.com/a")
                    .duration_hours(1)
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(record.expires_at, base() + SignedDuration::from_hours(1));
        let got = h.service.get_link(&record.code).await.unwrap().unwrap();
        assert_eq!(got.original_url, "https://example.com/a");
    }

    #[tokio::test]
    async fn create_populates_cache_after_store() {
        let h = random_harness();

        let record = h.service.create_link(url("https://example.com")).await.unwrap();

        assert_eq!(h.repo.len(), 1);
        assert_eq!(h.cache.get_url(&record.code).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn custom_code_is_used_verbatim() {
        let h = random_harness();

        let record = h
            .service
            .create_link(
                CreateLink::builder()
                    .original_url("https://x.test")
                    .custom_code(code("promo1"))
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(record.code.as_str(), "promo1");
        assert!(record.is_custom);
    }

    #[tokio::test]
    async fn duplicate_custom_code_conflicts_and_keeps_first() {
        let h = random_harness();
        let create = |target: &str| {
            CreateLink::builder()
                .original_url(target)
                .custom_code(code("promo1"))
                .build()
        };

        h.service.create_link(create("https://x.test")).await.unwrap();
        let err = h.service.create_link(create("https://y.test")).await.unwrap_err();

        assert!(matches!(err, ResolveError::Conflict(ref c) if c.as_str() == "promo1"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let got = h.service.get_link(&code("promo1")).await.unwrap().unwrap();
        assert_eq!(got.original_url, "https://x.test");
    }

    #[tokio::test]
    async fn expired_custom_code_stays_reserved_until_cleanup() {
        let h = random_harness();
        let create = || {
            CreateLink::builder()
                .original_url("https://x.test")
                .custom_code(code("promo1"))
                .duration_hours(1)
                .build()
        };

        h.service.create_link(create()).await.unwrap();
        h.clock.advance(SignedDuration::from_hours(2));

        let err = h.service.create_link(create()).await.unwrap_err();
        assert!(matches!(err, ResolveError::Conflict(_)));

        assert_eq!(h.service.cleanup().await.unwrap(), 1);
        h.service.create_link(create()).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_custom_creates_yield_exactly_one_success() {
        let h = random_harness();

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let service = h.service.clone();
                tokio::spawn(async move {
                    service
                        .create_link(
                            CreateLink::builder()
                                .original_url(format!("https://racer{i}.test"))
                                .custom_code(code("promo1"))
                                .build(),
                        )
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => successes += 1,
                Err(ResolveError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(h.repo.len(), 1);
    }

    #[tokio::test]
    async fn custom_code_conflict_from_store_race_maps_to_conflict() {
        let clock = ManualClock::new(base());
        let repo = RacingRepository {
            inner: InMemoryRepository::with_clock(clock.clone()),
            conflicts: AtomicU32::new(1),
        };
        let service = ResolutionService::with_clock(
            ResolverConfig::default(),
            repo,
            MokaUrlCache::new(),
            SeqGenerator::with_prefix("t").unwrap(),
            clock,
        );

        let err = service
            .create_link(
                CreateLink::builder()
                    .original_url("https://x.test")
                    .custom_code(code("promo1"))
                    .build(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::Conflict(_)));
    }

    #[tokio::test]
    async fn generated_collision_is_retried_with_fresh_code() {
        let (generator, calls) = ScriptedGenerator::new(&["taken1", "taken1", "fresh1"]);
        let h = harness(generator);
        h.repo
            .create_link(NewLink {
                code: code("taken1"),
                original_url: "https://first.test".to_string(),
                expires_at: base() + SignedDuration::from_hours(1),
                is_custom: false,
            })
            .await
            .unwrap();

        let record = h.service.create_link(url("https://second.test")).await.unwrap();

        assert_eq!(record.code.as_str(), "fresh1");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn generation_gives_up_after_five_candidates() {
        let (generator, calls) = ScriptedGenerator::new(&["taken1"]);
        let h = harness(generator);
        h.repo
            .create_link(NewLink {
                code: code("taken1"),
                original_url: "https://first.test".to_string(),
                expires_at: base() + SignedDuration::from_hours(1),
                is_custom: false,
            })
            .await
            .unwrap();

        let err = h.service.create_link(url("https://second.test")).await.unwrap_err();

        assert!(matches!(err, ResolveError::GenerationExhausted { attempts: 5 }));
        assert_eq!(err.kind(), ErrorKind::GenerationExhausted);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(h.repo.len(), 1);
    }

    #[tokio::test]
    async fn store_conflict_on_generated_code_consumes_an_attempt() {
        let clock = ManualClock::new(base());
        let repo = RacingRepository {
            inner: InMemoryRepository::with_clock(clock.clone()),
            conflicts: AtomicU32::new(2),
        };
        let service = ResolutionService::with_clock(
            ResolverConfig::default(),
            repo,
            MokaUrlCache::new(),
            SeqGenerator::with_prefix("t").unwrap(),
            clock,
        );

        let record = service.create_link(url("https://x.test")).await.unwrap();

        assert_eq!(record.code.as_str(), "t000002");
    }

    #[tokio::test]
    async fn store_conflicts_count_toward_the_bound() {
        let clock = ManualClock::new(base());
        let repo = RacingRepository {
            inner: InMemoryRepository::with_clock(clock.clone()),
            conflicts: AtomicU32::new(u32::MAX),
        };
        let service = ResolutionService::with_clock(
            ResolverConfig::default(),
            repo,
            MokaUrlCache::new(),
            SeqGenerator::with_prefix("t").unwrap(),
            clock,
        );

        let err = service.create_link(url("https://x.test")).await.unwrap_err();

        assert!(matches!(err, ResolveError::GenerationExhausted { attempts: 5 }));
    }

    #[tokio::test]
    async fn cache_write_failure_surfaces_but_link_persists() {
        let clock = ManualClock::new(base());
        let repo = InMemoryRepository::with_clock(clock.clone());
        let service = ResolutionService::with_clock(
            ResolverConfig::default(),
            repo.clone(),
            BrokenCache::default(),
            SeqGenerator::with_prefix("t").unwrap(),
            clock,
        );

        let err = service.create_link(url("https://x.test")).await.unwrap_err();
        assert!(matches!(err, ResolveError::Cache { operation: "cache_link", .. }));
        assert_eq!(err.kind(), ErrorKind::Internal);

        // The durable write stands and is still resolvable.
        assert_eq!(repo.len(), 1);
        let got = service.get_link(&code("t000000")).await.unwrap().unwrap();
        assert_eq!(got.original_url, "https://x.test");
    }

    #[tokio::test]
    async fn read_repair_failure_does_not_fail_lookup() {
        let clock = ManualClock::new(base());
        let repo = InMemoryRepository::with_clock(clock.clone());
        repo.create_link(NewLink {
            code: code("abc123"),
            original_url: "https://example.com".to_string(),
            expires_at: base() + SignedDuration::from_hours(1),
            is_custom: false,
        })
        .await
        .unwrap();
        let cache = BrokenCache::default();
        let writes = Arc::clone(&cache.writes);
        let service = ResolutionService::with_clock(
            ResolverConfig::default(),
            repo,
            cache,
            SeqGenerator::with_prefix("t").unwrap(),
            clock,
        );

        let got = service.get_link(&code("abc123")).await.unwrap();

        assert!(got.is_some());
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_miss_is_repaired_from_store() {
        let h = random_harness();
        let record = h.service.create_link(url("https://example.com")).await.unwrap();
        h.cache.del(&record.code).await.unwrap();

        let got = h.service.get_link(&record.code).await.unwrap();

        assert_eq!(got.as_ref(), Some(&record));
        assert_eq!(h.cache.get_url(&record.code).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let h = random_harness();

        assert!(h.service.get_link(&code("nope99")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_link_is_not_found_despite_stale_cache_entry() {
        let h = random_harness();
        let record = h
            .service
            .create_link(
                CreateLink::builder()
                    .original_url("https://example.com")
                    .duration_hours(1)
                    .build(),
            )
            .await
            .unwrap();

        // Moka runs on real time, so its entry is still present here.
        h.clock.advance(SignedDuration::from_hours(1));
        assert!(h.cache.get_url(&record.code).await.unwrap().is_some());

        assert!(h.service.get_link(&record.code).await.unwrap().is_none());
        assert!(h.cache.get_url(&record.code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_duration_link_is_never_served() {
        let h = random_harness();

        let record = h
            .service
            .create_link(
                CreateLink::builder()
                    .original_url("https://example.com")
                    .duration_hours(0)
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(record.expires_at, base());
        assert!(h.cache.get_url(&record.code).await.unwrap().is_none());
        assert!(h.service.get_link(&record.code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired_and_is_idempotent() {
        let h = random_harness();
        let short = h
            .service
            .create_link(
                CreateLink::builder()
                    .original_url("https://short.test")
                    .duration_hours(1)
                    .build(),
            )
            .await
            .unwrap();
        let long = h
            .service
            .create_link(
                CreateLink::builder()
                    .original_url("https://long.test")
                    .duration_hours(48)
                    .build(),
            )
            .await
            .unwrap();

        h.clock.advance(SignedDuration::from_hours(2));

        assert_eq!(h.service.cleanup().await.unwrap(), 1);
        assert_eq!(h.service.cleanup().await.unwrap(), 0);
        assert!(h.repo.is_code_available(&short.code).await.unwrap());
        assert!(h.service.get_link(&long.code).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn overflowing_duration_is_rejected() {
        let h = random_harness();

        let err = h
            .service
            .create_link(
                CreateLink::builder()
                    .original_url("https://example.com")
                    .duration_hours(u32::MAX)
                    .build(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(h.repo.is_empty());
    }

    fn unreachable_store<G: Generator>(
        generator: G,
    ) -> ResolutionService<UnreachableRepository, MokaUrlCache, G> {
        ResolutionService::with_clock(
            ResolverConfig::default(),
            UnreachableRepository,
            MokaUrlCache::new(),
            generator,
            ManualClock::new(base()),
        )
    }

    #[tokio::test]
    async fn store_failure_stops_generation_after_one_candidate() {
        let (generator, calls) = ScriptedGenerator::new(&["p000000"]);
        let service = unreachable_store(generator);

        let err = service.create_link(url("https://x.test")).await.unwrap_err();

        match &err {
            ResolveError::Storage {
                operation, code, ..
            } => {
                assert_eq!(*operation, "is_code_available");
                assert_eq!(code.as_ref().map(ShortCode::as_str), Some("p000000"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            err.to_string(),
            "storage failure during is_code_available for 'p000000': store unreachable: db down"
        );
    }

    #[tokio::test]
    async fn store_failure_on_custom_code_is_internal_not_conflict() {
        let service = unreachable_store(SeqGenerator::with_prefix("t").unwrap());

        let err = service
            .create_link(
                CreateLink::builder()
                    .original_url("https://x.test")
                    .custom_code(code("promo1"))
                    .build(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ResolveError::Storage { operation: "is_code_available", .. }
        ));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn store_failure_on_cache_miss_surfaces() {
        let service = unreachable_store(SeqGenerator::with_prefix("t").unwrap());

        let err = service.get_link(&code("abc123")).await.unwrap_err();

        assert!(matches!(
            err,
            ResolveError::Storage { operation: "get_by_code", code: Some(_), .. }
        ));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn cache_read_failure_surfaces_instead_of_falling_back() {
        let clock = ManualClock::new(base());
        let repo = InMemoryRepository::with_clock(clock.clone());
        repo.create_link(NewLink {
            code: code("abc123"),
            original_url: "https://example.com".to_string(),
            expires_at: base() + SignedDuration::from_hours(1),
            is_custom: false,
        })
        .await
        .unwrap();
        let service = ResolutionService::with_clock(
            ResolverConfig::default(),
            repo,
            UnreachableCache,
            SeqGenerator::with_prefix("t").unwrap(),
            clock,
        );

        let err = service.get_link(&code("abc123")).await.unwrap_err();

        match &err {
            ResolveError::Cache {
                operation, code, ..
            } => {
                assert_eq!(*operation, "get_url");
                assert_eq!(code.as_str(), "abc123");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(
            err.to_string(),
            "cache failure during get_url for 'abc123': cache unreachable: redis down"
        );
    }

    #[tokio::test]
    async fn cleanup_failure_surfaces_without_a_code() {
        let service = unreachable_store(SeqGenerator::with_prefix("t").unwrap());

        let err = service.cleanup().await.unwrap_err();

        assert!(matches!(
            err,
            ResolveError::Storage { operation: "delete_expired", code: None, .. }
        ));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(
            err.to_string(),
            "storage failure during delete_expired: store unreachable: db down"
        );
    }
}
