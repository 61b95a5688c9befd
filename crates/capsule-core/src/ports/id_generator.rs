//! IdGenerator port - ID 生成の抽象化
//!
//! テスト容易性のために trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::CapsuleId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は capsule の ID を生成
///
/// # ULID の特性
/// - 時刻でソート可能
/// - 調整なしで生成可能
/// - 128-bit（UUID 互換）
pub trait IdGenerator: Send + Sync {
    fn generate_capsule_id(&self) -> CapsuleId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// timestamp 部分は Clock から取るので、FixedClock を渡せば
/// テストでも生成時刻が決定的になる。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_capsule_id(&self) -> CapsuleId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        CapsuleId::from(ulid)
    }
}
