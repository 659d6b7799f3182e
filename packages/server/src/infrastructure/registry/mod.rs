//! Connection Registry の実装
//!
//! - `inmemory`: HashMap をインメモリストアとして使う実装（単一プロセス前提）

pub mod inmemory;

pub use inmemory::InMemoryConnectionRegistry;
