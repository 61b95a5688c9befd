//! CapsuleServiceBuilder - サービスの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 未指定の port は本番用のデフォルトで埋める

use std::sync::Arc;

use chrono::TimeDelta;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use super::service::{CapsulePolicy, CapsuleService};
use crate::domain::PlacementBounds;
use crate::domain::fragment::{POSITION_LIMITS, ROTATION_LIMITS, SCALE_LIMITS};
use crate::impls::InMemoryCapsuleStore;
use crate::ports::{CapsuleStore, Clock, IdGenerator, SystemClock, UlidGenerator};

/// CapsuleServiceBuilder は CapsuleService を構築
///
/// # 使用例
/// ```ignore
/// let service = CapsuleServiceBuilder::new()
///     .clock(Arc::new(FixedClock::new(now)))
///     .rng_seed(42)
///     .build()?;
/// ```
///
/// # デフォルト
/// - store: InMemoryCapsuleStore
/// - clock: SystemClock
/// - id_generator: 同じ clock を使う UlidGenerator
/// - rng: OS entropy から seed した StdRng
#[derive(Default)]
pub struct CapsuleServiceBuilder {
    store: Option<Arc<dyn CapsuleStore>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    rng: Option<Box<dyn RngCore + Send>>,
    policy: CapsulePolicy,
}

/// min_lead の上限（日数）
pub const MAX_MIN_LEAD_DAYS: i64 = 365 * 100;

/// BuildError はサービス構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("min_lead must not be negative, got {0}")]
    NegativeLead(TimeDelta),

    #[error("min_lead must be at most 36500 days, got {0}")]
    LeadTooLong(TimeDelta),

    #[error("invalid placement bounds: {0}")]
    InvalidPlacement(String),

    #[error("invalid page limit for {name}: default {default} exceeds max {max}")]
    InvalidPageLimit {
        name: &'static str,
        default: usize,
        max: usize,
    },
}

fn check_placement(bounds: &PlacementBounds) -> Result<(), BuildError> {
    let ranges = [
        ("x", &bounds.x, &POSITION_LIMITS),
        ("y", &bounds.y, &POSITION_LIMITS),
        ("rotation", &bounds.rotation, &ROTATION_LIMITS),
        ("scale", &bounds.scale, &SCALE_LIMITS),
    ];
    for (name, range, limits) in ranges {
        if range.is_empty() {
            return Err(BuildError::InvalidPlacement(format!("{name} range is empty")));
        }
        if range.start() < limits.start() || range.end() > limits.end() {
            return Err(BuildError::InvalidPlacement(format!(
                "{name} range {range:?} is outside {limits:?}"
            )));
        }
    }
    Ok(())
}

impl CapsuleServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn CapsuleStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// unlock 判定と created_at に使う時計
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Fragment 配置の乱数源
    pub fn rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// 同じ seed なら同じ配置列になる（テスト・デモ用）
    pub fn rng_seed(self, seed: u64) -> Self {
        self.rng(StdRng::seed_from_u64(seed))
    }

    pub fn policy(mut self, policy: CapsulePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn min_lead(mut self, min_lead: TimeDelta) -> Self {
        self.policy.min_lead = min_lead;
        self
    }

    /// CapsuleService を構築
    ///
    /// # 検証
    /// - min_lead が負でなく、上限以下であること
    /// - 配置範囲が空でなく、手動移動の上限に収まっていること
    /// - 各ページ上限で default <= max であること
    pub fn build(self) -> Result<CapsuleService, BuildError> {
        if self.policy.min_lead < TimeDelta::zero() {
            return Err(BuildError::NegativeLead(self.policy.min_lead));
        }
        if self.policy.min_lead > TimeDelta::days(MAX_MIN_LEAD_DAYS) {
            return Err(BuildError::LeadTooLong(self.policy.min_lead));
        }
        check_placement(&self.policy.placement)?;
        for (name, limit) in [
            ("list", self.policy.list_limit),
            ("unlocked", self.policy.unlocked_limit),
            ("locked", self.policy.locked_limit),
        ] {
            if limit.default > limit.max {
                return Err(BuildError::InvalidPageLimit {
                    name,
                    default: limit.default,
                    max: limit.max,
                });
            }
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryCapsuleStore::new()));
        let rng = self
            .rng
            .unwrap_or_else(|| Box::new(StdRng::from_entropy()));

        Ok(CapsuleService::from_parts(store, clock, ids, rng, self.policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::PageLimit;

    #[test]
    fn test_build_with_defaults() {
        let service = CapsuleServiceBuilder::new().build();
        assert!(service.is_ok());
    }

    #[test]
    fn test_build_negative_lead() {
        let service = CapsuleServiceBuilder::new()
            .min_lead(TimeDelta::minutes(-1))
            .build();
        assert!(matches!(service, Err(BuildError::NegativeLead(_))));
    }

    #[test]
    fn test_build_lead_too_long() {
        let service = CapsuleServiceBuilder::new()
            .min_lead(TimeDelta::days(MAX_MIN_LEAD_DAYS + 1))
            .build();
        assert!(matches!(service, Err(BuildError::LeadTooLong(_))));

        let service = CapsuleServiceBuilder::new()
            .min_lead(TimeDelta::days(MAX_MIN_LEAD_DAYS))
            .build();
        assert!(service.is_ok());
    }

    #[test]
    fn test_build_zero_lead_is_allowed() {
        let service = CapsuleServiceBuilder::new()
            .min_lead(TimeDelta::zero())
            .build();
        assert!(service.is_ok());
    }

    #[test]
    fn test_build_placement_outside_limits() {
        let policy = CapsulePolicy {
            placement: PlacementBounds {
                x: -5.0..=50.0,
                ..PlacementBounds::default()
            },
            ..CapsulePolicy::default()
        };
        let service = CapsuleServiceBuilder::new().policy(policy).build();
        assert!(matches!(service, Err(BuildError::InvalidPlacement(msg)) if msg.starts_with("x ")));
    }

    #[test]
    fn test_build_rotation_outside_limits() {
        for rotation in [-45.0..=15.0, -15.0..=f64::INFINITY] {
            let policy = CapsulePolicy {
                placement: PlacementBounds {
                    rotation,
                    ..PlacementBounds::default()
                },
                ..CapsulePolicy::default()
            };
            let service = CapsuleServiceBuilder::new().policy(policy).build();
            assert!(matches!(
                service,
                Err(BuildError::InvalidPlacement(msg)) if msg.starts_with("rotation ")
            ));
        }
    }

    #[test]
    fn test_build_empty_scale_range() {
        let policy = CapsulePolicy {
            placement: PlacementBounds {
                scale: 1.2..=0.8,
                ..PlacementBounds::default()
            },
            ..CapsulePolicy::default()
        };
        let service = CapsuleServiceBuilder::new().policy(policy).build();
        assert!(matches!(service, Err(BuildError::InvalidPlacement(_))));
    }

    #[test]
    fn test_build_page_limit_default_over_max() {
        let policy = CapsulePolicy {
            locked_limit: PageLimit::new(60, 50),
            ..CapsulePolicy::default()
        };
        let service = CapsuleServiceBuilder::new().policy(policy).build();
        assert!(matches!(
            service,
            Err(BuildError::InvalidPageLimit { name: "locked", .. })
        ));
    }
}
