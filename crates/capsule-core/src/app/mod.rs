//! App - アプリケーション層
//!
//! ports を組み合わせて capsule の操作を実装します。
//!
//! # 主要コンポーネント
//! - **CapsuleServiceBuilder**: サービスの構築とワイヤリング
//! - **CapsuleService**: create / get / list / reposition などの操作

pub mod builder;
pub mod service;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, CapsuleServiceBuilder};
pub use self::service::{CapsulePage, CapsulePolicy, CapsuleService, ListQuery, PageLimit};
