//! ユーザーディレクトリの実装
//!
//! - `inmemory`: JSON ファイルから読み込んだユーザー一覧
//! - `open`: 有効な ID なら誰でも最小プロフィールで解決する（開発用）

pub mod inmemory;
pub mod open;

pub use inmemory::{DirectoryError, InMemoryUserDirectory};
pub use open::OpenUserDirectory;
