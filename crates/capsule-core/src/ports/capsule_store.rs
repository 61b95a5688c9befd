//! CapsuleStore port - capsule の正本（source of truth）
//!
//! core は store にクエリを組み立てて渡すだけで、SQL などは知らない。
//! 実装は `impls::InMemoryCapsuleStore`。
//!
//! # 設計原則
//! - 1 レコード単位の atomic な create / update_position / delete
//! - lock 状態は保存しない（`window` は呼び出し時の `now` で評価する）

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Capsule, CapsuleError, CapsuleId, ContentType, FragmentUpdate};

/// Which side of the unlock boundary to keep, evaluated at the given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnlockWindow {
    #[default]
    Any,
    /// `unlock_date <= at`
    UnlockedAt(DateTime<Utc>),
    /// `unlock_date > at`
    LockedAt(DateTime<Utc>),
}

impl UnlockWindow {
    pub fn admits(&self, unlock_date: DateTime<Utc>) -> bool {
        match *self {
            Self::Any => true,
            Self::UnlockedAt(at) => unlock_date <= at,
            Self::LockedAt(at) => unlock_date > at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// `created_at` descending.
    #[default]
    NewestFirst,
    /// `unlock_date` ascending.
    SoonestUnlock,
}

/// Query handed to [`CapsuleStore::list_candidates`].
#[derive(Debug, Clone, Default)]
pub struct CapsuleFilter {
    pub public_only: bool,
    pub tag: Option<String>,
    pub content_type: Option<ContentType>,
    /// Case-insensitive match on title, or on content of capsules already
    /// unlocked at `search_at`.
    pub search: Option<String>,
    pub search_at: Option<DateTime<Utc>>,
    pub window: UnlockWindow,
    pub order: SortOrder,
}

impl CapsuleFilter {
    pub fn public() -> Self {
        Self {
            public_only: true,
            ..Self::default()
        }
    }

    pub fn with_window(mut self, window: UnlockWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Whether one record passes every criterion.
    pub fn matches(&self, capsule: &Capsule) -> bool {
        if self.public_only && !capsule.is_public {
            return false;
        }
        if let Some(tag) = &self.tag
            && !capsule.has_tag(tag)
        {
            return false;
        }
        if let Some(ct) = self.content_type
            && capsule.content_type != ct
        {
            return false;
        }
        if !self.window.admits(capsule.unlock_date) {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let in_title = capsule.title.to_lowercase().contains(&needle);
            let content_visible = self
                .search_at
                .is_some_and(|at| capsule.unlock_date <= at);
            let in_content = content_visible && capsule.content.to_lowercase().contains(&needle);
            if !in_title && !in_content {
                return false;
            }
        }
        true
    }
}

/// Persistence collaborator.
#[async_trait]
pub trait CapsuleStore: Send + Sync {
    /// Insert a new record and return its id.
    async fn create(&self, capsule: Capsule) -> Result<CapsuleId, CapsuleError>;

    async fn load(&self, id: CapsuleId) -> Result<Option<Capsule>, CapsuleError>;

    /// Apply `update` to the stored fragment of one record.
    ///
    /// Reading the current fragment, merging and writing back happen as one
    /// step, so concurrent updates to the same record are never lost.
    /// `None` when the id is unknown.
    async fn update_position(
        &self,
        id: CapsuleId,
        update: FragmentUpdate,
    ) -> Result<Option<Capsule>, CapsuleError>;

    /// Remove one record. `false` when the id is unknown.
    async fn delete(&self, id: CapsuleId) -> Result<bool, CapsuleError>;

    /// Every record matching `filter`, in `filter.order`.
    async fn list_candidates(&self, filter: &CapsuleFilter) -> Result<Vec<Capsule>, CapsuleError>;
}
