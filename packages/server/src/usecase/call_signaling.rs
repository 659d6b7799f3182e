//! UseCase: 通話シグナリング
//!
//! 2 人のユーザー間の `call-user` / `call-joined` / `end-call` を相手に中継する。
//! 通話の状態はサーバーでは保持しない（Invited → Accepted → Active → Ended は各クライアントが持つ）。
//!
//! 中継は fire-and-forget で、ACK も再送もない。
//! 相手がオフラインなのは正常な結果（`DeliveryOutcome::PeerUnreachable`）として扱う。

use std::sync::Arc;

use crate::{
    domain::{
        CallSignal, DeliveryOutcome, MessagePushError, MessagePusher, RoomId, SignalKind, UserId,
        UserProfile,
    },
    infrastructure::dto::websocket::{
        CallEventPayload, IncomingCallPayload, PeerUnreachablePayload, ServerEvent,
    },
};

use super::error::SignalError;

/// 通話シグナリングのユースケース
pub struct CallSignalingUseCase {
    message_pusher: Arc<dyn MessagePusher>,
    /// 相手に届かなかったとき発信者に `peer-unreachable` を返すか
    notify_unreachable: bool,
}

impl CallSignalingUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>, notify_unreachable: bool) -> Self {
        Self {
            message_pusher,
            notify_unreachable,
        }
    }

    /// 発信: 相手に `incoming-call` を届ける
    ///
    /// `caller` は認証済みユーザーのプロフィール。ペイロード上の `from` は信用しない。
    pub async fn call_user(
        &self,
        caller: &UserProfile,
        to: UserId,
        room_id: RoomId,
    ) -> Result<DeliveryOutcome, SignalError> {
        let signal = CallSignal {
            kind: SignalKind::Invite,
            from: caller.id.clone(),
            to,
            room_id,
        };
        self.execute(&signal, Some(caller)).await
    }

    /// 応答: 相手に `call-accepted` を届ける
    pub async fn call_joined(
        &self,
        from: &UserId,
        to: UserId,
        room_id: RoomId,
    ) -> Result<DeliveryOutcome, SignalError> {
        let signal = CallSignal {
            kind: SignalKind::Joined,
            from: from.clone(),
            to,
            room_id,
        };
        self.execute(&signal, None).await
    }

    /// 終了: 相手に `call-ended` を届ける
    pub async fn end_call(
        &self,
        from: &UserId,
        to: UserId,
        room_id: RoomId,
    ) -> Result<DeliveryOutcome, SignalError> {
        let signal = CallSignal {
            kind: SignalKind::End,
            from: from.clone(),
            to,
            room_id,
        };
        self.execute(&signal, None).await
    }

    async fn execute(
        &self,
        signal: &CallSignal,
        caller: Option<&UserProfile>,
    ) -> Result<DeliveryOutcome, SignalError> {
        // 1. 検証
        validate(signal)?;

        // 2. 相手向けのイベントを組み立てる
        let event = match signal.kind {
            SignalKind::Invite => {
                let from = caller
                    .cloned()
                    .unwrap_or_else(|| UserProfile::minimal(signal.from.clone()));
                ServerEvent::IncomingCall(IncomingCallPayload {
                    from: from.into(),
                    room_id: signal.room_id.to_string(),
                })
            }
            SignalKind::Joined => ServerEvent::CallAccepted(CallEventPayload {
                from: signal.from.to_string(),
                room_id: signal.room_id.to_string(),
            }),
            SignalKind::End => ServerEvent::CallEnded(CallEventPayload {
                from: signal.from.to_string(),
                room_id: signal.room_id.to_string(),
            }),
        };
        let json = serde_json::to_string(&event).map_err(|e| SignalError::Encode(e.to_string()))?;

        // 3. 相手の現在の接続に送る
        match self.message_pusher.push_to(&signal.to, &json).await {
            Ok(()) => {
                tracing::info!(
                    "Relayed {} from '{}' to '{}' in {}",
                    event.name(),
                    signal.from,
                    signal.to,
                    signal.room_id
                );
                Ok(DeliveryOutcome::Delivered)
            }
            Err(e) => {
                match e {
                    MessagePushError::ClientNotFound(_) => tracing::debug!(
                        "Dropped {}: '{}' is offline",
                        signal.kind.inbound_event(),
                        signal.to
                    ),
                    MessagePushError::PushFailed(reason) => tracing::warn!(
                        "Dropped {} for '{}': {}",
                        signal.kind.inbound_event(),
                        signal.to,
                        reason
                    ),
                }
                if self.notify_unreachable {
                    self.report_unreachable(signal).await?;
                }
                Ok(DeliveryOutcome::PeerUnreachable)
            }
        }
    }

    async fn report_unreachable(&self, signal: &CallSignal) -> Result<(), SignalError> {
        let event = ServerEvent::PeerUnreachable(PeerUnreachablePayload {
            to: signal.to.to_string(),
            room_id: signal.room_id.to_string(),
        });
        let json = serde_json::to_string(&event).map_err(|e| SignalError::Encode(e.to_string()))?;
        if let Err(e) = self.message_pusher.push_to(&signal.from, &json).await {
            tracing::debug!("Could not report unreachable peer to '{}': {}", signal.from, e);
        }
        Ok(())
    }
}

fn validate(signal: &CallSignal) -> Result<(), SignalError> {
    let expected = RoomId::for_pair(&signal.from, &signal.to)
        .map_err(|_| SignalError::SelfSignal(signal.from.to_string()))?;
    if expected != signal.room_id {
        return Err(SignalError::RoomMismatch {
            expected: expected.to_string(),
            actual: signal.room_id.to_string(),
        });
    }
    Ok(())
}
