//! Domain model (ids, capsule record, unlock evaluation, fragment placement, views).
//!
//! ここにある関数はすべて純粋関数です（I/O なし）。
//! 時刻と乱数は呼び出し側から渡されます。

pub mod capsule;
pub mod errors;
pub mod fragment;
pub mod ids;
pub mod unlock;
pub mod view;

pub use capsule::{Capsule, ContentType, NewCapsule, TagsInput, ValidatedCapsule, normalize_tags};
pub use errors::{CapsuleError, ErrorKind};
pub use fragment::{Fragment, FragmentUpdate, PlacementBounds, place, reposition};
pub use ids::{CapsuleId, ParseIdError};
pub use unlock::{
    Evaluation, TimeRemaining, UnlockStatus, evaluate, evaluate_now, parse_unlock_date,
};
pub use view::{CapsuleView, ContentPolicy};
