//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! core は時刻・ID・永続化をすべてここを経由して受け取ります。

pub mod capsule_store;
pub mod clock;
pub mod id_generator;

pub use self::capsule_store::{CapsuleFilter, CapsuleStore, SortOrder, UnlockWindow};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
