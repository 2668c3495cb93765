//! Admission control: fixed-window request budgets per limiter class and
//! subject.
//!
//! Each `(class, subject)` pair owns a bucket that starts full on first use,
//! loses one point per admitted request, and refills completely once its
//! window has elapsed. Refilling all at once allows a burst of up to twice
//! the budget across a window boundary; that is accepted.
//!
//! Bucket state lives behind [`CounterStore`]. [`MemoryCounterStore`] keeps
//! it in process memory, so several server instances behind a load balancer
//! each enforce their own budget. Deployments that need one shared budget
//! plug in a store backed by an external counter service.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

const MINUTE: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Classes and budgets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimiterClass {
    General,
    Posts,
    Replies,
    Login,
}

impl LimiterClass {
    pub const ALL: [LimiterClass; 4] = [
        LimiterClass::General,
        LimiterClass::Posts,
        LimiterClass::Replies,
        LimiterClass::Login,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LimiterClass::General => "general",
            LimiterClass::Posts => "posts",
            LimiterClass::Replies => "replies",
            LimiterClass::Login => "login",
        }
    }
}

impl fmt::Display for LimiterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LimiterClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LimiterClass::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown limiter class '{s}'")))
    }
}

/// Points available per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub points: u32,
    #[serde(rename = "windowSecs", serialize_with = "serialize_secs")]
    pub window: Duration,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

impl Budget {
    pub const fn new(points: u32, window: Duration) -> Self {
        Self { points, window }
    }
}

/// Budgets for every limiter class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitPolicy {
    pub general: Budget,
    pub posts: Budget,
    pub replies: Budget,
    pub login: Budget,
}

impl RateLimitPolicy {
    /// Login attempts are held to the same budget in every environment.
    const LOGIN: Budget = Budget::new(5, Duration::from_secs(300));

    pub fn development() -> Self {
        Self {
            general: Budget::new(100, MINUTE),
            posts: Budget::new(20, MINUTE),
            replies: Budget::new(30, MINUTE),
            login: Self::LOGIN,
        }
    }

    pub fn production() -> Self {
        Self {
            general: Budget::new(50, MINUTE),
            posts: Budget::new(5, MINUTE),
            replies: Budget::new(10, MINUTE),
            login: Self::LOGIN,
        }
    }

    pub fn for_environment(production: bool) -> Self {
        if production {
            Self::production()
        } else {
            Self::development()
        }
    }

    pub fn budget(&self, class: LimiterClass) -> Budget {
        match class {
            LimiterClass::General => self.general,
            LimiterClass::Posts => self.posts,
            LimiterClass::Replies => self.replies,
            LimiterClass::Login => self.login,
        }
    }
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

/// Who a budget is tracked against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubjectKey {
    User(DbId),
    Address(String),
}

impl SubjectKey {
    /// Pick the subject for a request.
    ///
    /// Authenticated callers are tracked by user id so they cannot spread
    /// requests over several addresses. Login attempts are always tracked by
    /// address since the caller is not yet known.
    pub fn select(class: LimiterClass, user_id: Option<DbId>, address: &str) -> Self {
        match (class, user_id) {
            (LimiterClass::Login, _) | (_, None) => SubjectKey::Address(address.to_string()),
            (_, Some(id)) => SubjectKey::User(id),
        }
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectKey::User(id) => write!(f, "user:{id}"),
            SubjectKey::Address(addr) => write!(f, "ip:{addr}"),
        }
    }
}

impl FromStr for SubjectKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix("user:") {
            return id
                .parse()
                .map(SubjectKey::User)
                .map_err(|_| CoreError::Validation(format!("Invalid user subject '{s}'")));
        }
        match s.strip_prefix("ip:") {
            Some(addr) if !addr.is_empty() => Ok(SubjectKey::Address(addr.to_string())),
            _ => Err(CoreError::Validation(format!(
                "Subject must look like 'user:<id>' or 'ip:<address>', got '{s}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub class: LimiterClass,
    pub subject: SubjectKey,
}

// ---------------------------------------------------------------------------
// Decisions and stores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The point is spent; it is not refunded if the request later fails.
    Admitted { limit: u32, remaining: u32 },
    Rejected { retry_after_secs: u64 },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

/// Storage for bucket state.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Spend one point from `key`'s bucket, creating it if needed.
    async fn hit(&self, key: &BucketKey, budget: Budget, now: Instant) -> Admission;

    /// Drop `key`'s bucket. Returns whether one existed.
    async fn reset(&self, key: &BucketKey) -> bool;

    /// Drop buckets whose window ended before `now`. Returns how many.
    async fn purge_expired(&self, now: Instant) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    points_remaining: u32,
    window_reset_at: Instant,
}

impl Bucket {
    fn full(budget: Budget, now: Instant) -> Self {
        Self {
            points_remaining: budget.points,
            window_reset_at: now + budget.window,
        }
    }
}

/// Process-local bucket storage.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    buckets: DashMap<BucketKey, Bucket>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(&self, key: &BucketKey, budget: Budget, now: Instant) -> Admission {
        let mut bucket = self
            .buckets
            .entry(key.clone())
            .or_insert_with(|| Bucket::full(budget, now));

        if now >= bucket.window_reset_at {
            *bucket = Bucket::full(budget, now);
        }

        if bucket.points_remaining == 0 {
            let wait = bucket.window_reset_at.saturating_duration_since(now);
            return Admission::Rejected {
                retry_after_secs: (wait.as_secs_f64().ceil() as u64).max(1),
            };
        }

        bucket.points_remaining -= 1;
        Admission::Admitted {
            limit: budget.points,
            remaining: bucket.points_remaining,
        }
    }

    async fn reset(&self, key: &BucketKey) -> bool {
        self.buckets.remove(key).is_some()
    }

    async fn purge_expired(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| bucket.window_reset_at > now);
        before.saturating_sub(self.buckets.len())
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Applies a [`RateLimitPolicy`] on top of a [`CounterStore`].
#[derive(Clone)]
pub struct AdmissionController {
    policy: RateLimitPolicy,
    store: Arc<dyn CounterStore>,
}

impl AdmissionController {
    pub fn new(policy: RateLimitPolicy, store: Arc<dyn CounterStore>) -> Self {
        Self { policy, store }
    }

    /// Controller backed by a fresh [`MemoryCounterStore`].
    pub fn in_memory(policy: RateLimitPolicy) -> Self {
        Self::new(policy, Arc::new(MemoryCounterStore::new()))
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    pub async fn consume(&self, class: LimiterClass, subject: &SubjectKey) -> Admission {
        self.consume_at(class, subject, Instant::now()).await
    }

    pub async fn consume_at(
        &self,
        class: LimiterClass,
        subject: &SubjectKey,
        now: Instant,
    ) -> Admission {
        let key = BucketKey {
            class,
            subject: subject.clone(),
        };
        self.store.hit(&key, self.policy.budget(class), now).await
    }

    pub async fn reset(&self, class: LimiterClass, subject: &SubjectKey) -> bool {
        let key = BucketKey {
            class,
            subject: subject.clone(),
        };
        self.store.reset(&key).await
    }

    pub async fn purge_expired(&self) -> usize {
        self.store.purge_expired(Instant::now()).await
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn controller() -> AdmissionController {
        AdmissionController::in_memory(RateLimitPolicy::development())
    }

    fn addr(a: &str) -> SubjectKey {
        SubjectKey::Address(a.to_string())
    }

    #[tokio::test]
    async fn exactly_budget_requests_pass_within_a_window() {
        let limiter = controller();
        let subject = SubjectKey::User(1);
        let now = Instant::now();

        for i in 0..20 {
            assert_matches!(
                limiter.consume_at(LimiterClass::Posts, &subject, now).await,
                Admission::Admitted { limit: 20, remaining } if remaining == 19 - i
            );
        }

        let rejected = limiter.consume_at(LimiterClass::Posts, &subject, now).await;
        assert_matches!(rejected, Admission::Rejected { retry_after_secs } => {
            assert!(retry_after_secs > 0);
            assert!(retry_after_secs <= 60);
        });
    }

    #[tokio::test]
    async fn sixth_login_attempt_is_rejected() {
        let limiter = AdmissionController::in_memory(RateLimitPolicy::production());
        let subject = addr("203.0.113.9");
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter
                .consume_at(LimiterClass::Login, &subject, start)
                .await
                .is_admitted());
        }
        let later = start + Duration::from_secs(100);
        assert_matches!(
            limiter.consume_at(LimiterClass::Login, &subject, later).await,
            Admission::Rejected { retry_after_secs: 200 }
        );
    }

    #[tokio::test]
    async fn window_elapse_refills_the_bucket() {
        let limiter = controller();
        let subject = addr("198.51.100.1");
        let start = Instant::now();

        for _ in 0..5 {
            limiter.consume_at(LimiterClass::Login, &subject, start).await;
        }
        assert!(!limiter
            .consume_at(LimiterClass::Login, &subject, start)
            .await
            .is_admitted());

        let next_window = start + Duration::from_secs(300);
        assert_matches!(
            limiter.consume_at(LimiterClass::Login, &subject, next_window).await,
            Admission::Admitted { limit: 5, remaining: 4 }
        );
    }

    #[tokio::test]
    async fn subjects_do_not_interfere() {
        let limiter = controller();
        let now = Instant::now();
        let noisy = addr("10.0.0.1");
        let quiet = addr("10.0.0.2");

        for _ in 0..5 {
            limiter.consume_at(LimiterClass::Login, &noisy, now).await;
        }
        assert!(!limiter
            .consume_at(LimiterClass::Login, &noisy, now)
            .await
            .is_admitted());
        assert_matches!(
            limiter.consume_at(LimiterClass::Login, &quiet, now).await,
            Admission::Admitted { remaining: 4, .. }
        );
    }

    #[tokio::test]
    async fn classes_do_not_interfere() {
        let limiter = controller();
        let now = Instant::now();
        let subject = addr("10.0.0.3");

        for _ in 0..5 {
            limiter.consume_at(LimiterClass::Login, &subject, now).await;
        }
        assert!(limiter
            .consume_at(LimiterClass::General, &subject, now)
            .await
            .is_admitted());
    }

    #[tokio::test]
    async fn reset_restores_the_budget() {
        let limiter = controller();
        let subject = addr("10.0.0.4");
        for _ in 0..6 {
            limiter.consume(LimiterClass::Login, &subject).await;
        }
        assert!(limiter.reset(LimiterClass::Login, &subject).await);
        assert!(!limiter.reset(LimiterClass::Login, &subject).await);
        assert!(limiter.consume(LimiterClass::Login, &subject).await.is_admitted());
    }

    #[tokio::test]
    async fn purge_drops_only_elapsed_buckets() {
        let store = MemoryCounterStore::new();
        let now = Instant::now();
        let short = Budget::new(1, Duration::from_secs(10));
        let long = Budget::new(1, Duration::from_secs(600));
        let key = |s: &str| BucketKey {
            class: LimiterClass::General,
            subject: addr(s),
        };

        store.hit(&key("a"), short, now).await;
        store.hit(&key("b"), long, now).await;
        assert_eq!(store.purge_expired(now + Duration::from_secs(11)).await, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn production_budgets_are_stricter() {
        let dev = RateLimitPolicy::development();
        let prod = RateLimitPolicy::production();
        assert_eq!(dev.general.points, 100);
        assert_eq!(prod.general.points, 50);
        assert_eq!(dev.posts.points, 20);
        assert_eq!(prod.posts.points, 5);
        assert_eq!(dev.replies.points, 30);
        assert_eq!(prod.replies.points, 10);
        assert_eq!(dev.login, prod.login);
        assert_eq!(prod.login.window, Duration::from_secs(300));
    }

    #[test]
    fn subject_selection_prefers_user_except_for_login() {
        assert_eq!(
            SubjectKey::select(LimiterClass::Posts, Some(9), "1.2.3.4"),
            SubjectKey::User(9)
        );
        assert_eq!(
            SubjectKey::select(LimiterClass::General, None, "1.2.3.4"),
            addr("1.2.3.4")
        );
        assert_eq!(
            SubjectKey::select(LimiterClass::Login, Some(9), "1.2.3.4"),
            addr("1.2.3.4")
        );
    }

    #[test]
    fn subject_keys_parse_from_display_form() {
        for key in [SubjectKey::User(42), addr("::1")] {
            assert_eq!(key.to_string().parse::<SubjectKey>().unwrap(), key);
        }
        assert!("42".parse::<SubjectKey>().is_err());
        assert!("user:abc".parse::<SubjectKey>().is_err());
    }
}
