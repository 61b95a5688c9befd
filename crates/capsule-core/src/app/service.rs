//! CapsuleService - ports を組み合わせたアプリケーション層
//!
//! すべての読み取りは呼び出し時点の `clock.now()` で unlock 判定をやり直す。
//! 判定結果はキャッシュも保存もしない。

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::TimeDelta;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{
    CapsuleError, CapsuleId, CapsuleView, ContentPolicy, ContentType, Fragment, FragmentUpdate,
    NewCapsule, PlacementBounds, evaluate,
};
use crate::observability::CapsuleCounts;
use crate::ports::{CapsuleFilter, CapsuleStore, Clock, IdGenerator, SortOrder, UnlockWindow};

/// Default and maximum page size for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimit {
    pub default: usize,
    pub max: usize,
}

impl PageLimit {
    pub const fn new(default: usize, max: usize) -> Self {
        Self { default, max }
    }

    pub fn resolve(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default).min(self.max)
    }
}

/// Tunables of the service.
#[derive(Debug, Clone)]
pub struct CapsulePolicy {
    /// Shortest allowed gap between creation and unlock.
    pub min_lead: TimeDelta,
    pub placement: PlacementBounds,
    pub list_limit: PageLimit,
    pub unlocked_limit: PageLimit,
    pub locked_limit: PageLimit,
}

impl Default for CapsulePolicy {
    fn default() -> Self {
        Self {
            min_lead: TimeDelta::minutes(5),
            placement: PlacementBounds::default(),
            list_limit: PageLimit::new(50, 100),
            unlocked_limit: PageLimit::new(30, 100),
            locked_limit: PageLimit::new(10, 50),
        }
    }
}

/// Query for [`CapsuleService::list`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub tag: Option<String>,
    pub search: Option<String>,
    pub content_type: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// One page of [`CapsuleService::list`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsulePage {
    pub capsules: Vec<CapsuleView>,
    /// Matches before paging.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

fn non_blank(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub struct CapsuleService {
    store: Arc<dyn CapsuleStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    rng: Mutex<Box<dyn RngCore + Send>>,
    policy: CapsulePolicy,
}

impl CapsuleService {
    pub(crate) fn from_parts(
        store: Arc<dyn CapsuleStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        rng: Box<dyn RngCore + Send>,
        policy: CapsulePolicy,
    ) -> Self {
        Self {
            store,
            clock,
            ids,
            rng: Mutex::new(rng),
            policy,
        }
    }

    pub fn policy(&self) -> &CapsulePolicy {
        &self.policy
    }

    fn place(&self) -> Result<Fragment, CapsuleError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| CapsuleError::Internal("placement rng is poisoned".into()))?;
        Ok(self.policy.placement.place(&mut **rng))
    }

    /// Validate, place and store a new capsule.
    ///
    /// The returned view never carries content: a freshly created capsule is
    /// always locked.
    pub async fn create(&self, new: NewCapsule) -> Result<CapsuleView, CapsuleError> {
        let now = self.clock.now();
        let validated = new.validate(now, self.policy.min_lead).inspect_err(|e| {
            warn!(error = %e, "rejected capsule creation");
        })?;

        let fragment = self.place()?;
        let id = self.ids.generate_capsule_id();
        let capsule = validated.into_capsule(id, now, fragment);
        let view = CapsuleView::render(&capsule, now, ContentPolicy::Omit);

        self.store.create(capsule).await?;
        info!(
            capsule_id = %id,
            unlock_date = %view.unlock_date,
            x = fragment.x,
            y = fragment.y,
            "capsule created"
        );
        Ok(view)
    }

    /// Fetch one public capsule. Content is present only once unlocked.
    pub async fn get(&self, id: CapsuleId) -> Result<CapsuleView, CapsuleError> {
        let capsule = self
            .store
            .load(id)
            .await?
            .ok_or(CapsuleError::NotFound(id))?;
        if !capsule.is_public {
            return Err(CapsuleError::Forbidden(id));
        }
        let view = CapsuleView::render(&capsule, self.clock.now(), ContentPolicy::Include);
        debug!(capsule_id = %id, status = ?view.status, "capsule read");
        Ok(view)
    }

    /// Public capsules, newest first, filtered and paged.
    pub async fn list(&self, query: ListQuery) -> Result<CapsulePage, CapsuleError> {
        let now = self.clock.now();
        let content_type = non_blank(&query.content_type)
            .map(|raw| raw.parse::<ContentType>())
            .transpose()?;
        let filter = CapsuleFilter {
            tag: non_blank(&query.tag),
            content_type,
            search: non_blank(&query.search),
            search_at: Some(now),
            ..CapsuleFilter::public()
        };

        let limit = self.policy.list_limit.resolve(query.limit);
        let offset = query.offset.unwrap_or(0);

        let candidates = self.store.list_candidates(&filter).await?;
        let total = candidates.len();
        let capsules = candidates
            .iter()
            .skip(offset)
            .take(limit)
            .map(|c| CapsuleView::render(c, now, ContentPolicy::Include))
            .collect();

        debug!(total, limit, offset, "capsules listed");
        Ok(CapsulePage {
            capsules,
            total,
            limit,
            offset,
        })
    }

    /// Unlocked public capsules for the collage, newest first.
    pub async fn unlocked(&self, limit: Option<usize>) -> Result<Vec<CapsuleView>, CapsuleError> {
        let now = self.clock.now();
        let limit = self.policy.unlocked_limit.resolve(limit);
        let filter = CapsuleFilter::public().with_window(UnlockWindow::UnlockedAt(now));

        let views = self
            .store
            .list_candidates(&filter)
            .await?
            .iter()
            .take(limit)
            .map(|c| CapsuleView::render(c, now, ContentPolicy::Include))
            .collect();
        Ok(views)
    }

    /// Locked public capsules, soonest unlock first. Never carries content.
    pub async fn locked(&self, limit: Option<usize>) -> Result<Vec<CapsuleView>, CapsuleError> {
        let now = self.clock.now();
        let limit = self.policy.locked_limit.resolve(limit);
        let filter = CapsuleFilter::public()
            .with_window(UnlockWindow::LockedAt(now))
            .with_order(SortOrder::SoonestUnlock);

        let views = self
            .store
            .list_candidates(&filter)
            .await?
            .iter()
            .take(limit)
            .map(|c| CapsuleView::render(c, now, ContentPolicy::Omit))
            .collect();
        Ok(views)
    }

    pub async fn delete(&self, id: CapsuleId) -> Result<(), CapsuleError> {
        if !self.store.delete(id).await? {
            return Err(CapsuleError::NotFound(id));
        }
        info!(capsule_id = %id, "capsule deleted");
        Ok(())
    }

    /// Move one capsule's fragment. Values are clamped into their limits.
    pub async fn reposition(
        &self,
        id: CapsuleId,
        update: FragmentUpdate,
    ) -> Result<CapsuleView, CapsuleError> {
        let updated = self
            .store
            .update_position(id, update)
            .await?
            .ok_or(CapsuleError::NotFound(id))?;
        let fragment = updated.fragment;
        info!(
            capsule_id = %id,
            x = fragment.x,
            y = fragment.y,
            rotation = fragment.rotation,
            scale = fragment.scale,
            "capsule repositioned"
        );
        Ok(CapsuleView::render(
            &updated,
            self.clock.now(),
            ContentPolicy::Include,
        ))
    }

    /// Every distinct tag on a public capsule, sorted.
    pub async fn tags(&self) -> Result<Vec<String>, CapsuleError> {
        let all: BTreeSet<String> = self
            .store
            .list_candidates(&CapsuleFilter::public())
            .await?
            .into_iter()
            .flat_map(|c| c.tags)
            .collect();
        Ok(all.into_iter().collect())
    }

    pub async fn stats(&self) -> Result<CapsuleCounts, CapsuleError> {
        let now = self.clock.now();
        let public = self.store.list_candidates(&CapsuleFilter::public()).await?;
        let unlocked = public
            .iter()
            .filter(|c| evaluate(c.unlock_date, now).is_unlocked())
            .count();
        Ok(CapsuleCounts {
            total: public.len(),
            unlocked,
            locked: public.len() - unlocked,
        })
    }
}
