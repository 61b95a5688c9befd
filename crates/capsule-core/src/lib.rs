//! capsule-core
//!
//! Core building blocks for the time capsule service.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, capsule, unlock, fragment, view, errors）
//! - **ports**: 抽象化レイヤー（CapsuleStore, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（CapsuleService, builder）
//! - **impls**: 実装（InMemoryCapsuleStore）
//! - **observability**: 集計ビュー

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;
pub mod observability;
