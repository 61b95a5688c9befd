//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryCapsuleStore**: 開発・テスト用の正本

pub mod inmem_store;

pub use self::inmem_store::InMemoryCapsuleStore;
