//! Domain layer
//!
//! リレーサーバーのビジネスルール（値オブジェクト、エンティティ）と、
//! ドメイン層が必要とする外部とのインターフェース（ポート）を定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

pub mod auth;
pub mod entity;
pub mod error;
pub mod pusher;
pub mod registry;
pub mod value_object;

pub use auth::{TokenVerifier, UserDirectory, VerifiedToken};
pub use entity::{CallSignal, ChatMessage, DeliveryOutcome, SignalKind, UserProfile};
pub use error::{MessagePushError, TokenError, ValueObjectError};
pub use pusher::MessagePusher;
pub use registry::{ConnectionHandle, ConnectionRegistry, PusherChannel};
pub use value_object::{ConnectionId, MessageText, ROOM_SEPARATOR, RoomId, Timestamp, UserId};
