//! Infrastructure 層
//!
//! ドメイン層の trait の実装（インメモリ Repository）、リアルタイム配信、
//! 外部とやり取りする DTO を提供します。

pub mod dto;
pub mod realtime;
pub mod repository;
