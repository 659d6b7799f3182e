//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    AuthenticateSessionUseCase, CallSignalingUseCase, ConnectUserUseCase, DisconnectUserUseCase,
    GetPresenceUseCase, RelayMessageUseCase,
};

/// Shared application state
pub struct AppState {
    /// AuthenticateSessionUseCase（接続認証のユースケース）
    pub authenticate_session_usecase: Arc<AuthenticateSessionUseCase>,
    /// ConnectUserUseCase（ユーザー接続のユースケース）
    pub connect_user_usecase: Arc<ConnectUserUseCase>,
    /// DisconnectUserUseCase（ユーザー切断のユースケース）
    pub disconnect_user_usecase: Arc<DisconnectUserUseCase>,
    /// CallSignalingUseCase（通話シグナリングのユースケース）
    pub call_signaling_usecase: Arc<CallSignalingUseCase>,
    /// RelayMessageUseCase（メッセージ中継のユースケース）
    pub relay_message_usecase: Arc<RelayMessageUseCase>,
    /// GetPresenceUseCase（オンライン状態取得のユースケース）
    pub get_presence_usecase: Arc<GetPresenceUseCase>,
}
