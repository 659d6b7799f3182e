//! UseCase 層
//!
//! 1 操作につき 1 ユースケース。ドメインのポート（trait）だけに依存する。

pub mod authenticate_session;
pub mod call_signaling;
pub mod connect_user;
pub mod disconnect_user;
pub mod error;
pub mod get_presence;
pub mod relay_message;

pub use authenticate_session::{AuthenticateSessionUseCase, SessionCredentials};
pub use call_signaling::CallSignalingUseCase;
pub use connect_user::ConnectUserUseCase;
pub use disconnect_user::DisconnectUserUseCase;
pub use error::{AuthError, RelayError, SignalError};
pub use get_presence::GetPresenceUseCase;
pub use relay_message::RelayMessageUseCase;
