//! 通話コントローラー
//!
//! ## 責務
//!
//! - ルーム ID を計算し、そのルームのリレーイベントを購読する
//! - `call-user` で発信を通知し、ビデオウィジェットを初期化する
//! - 相手とウィジェットからのイベントで状態を進める（`Connecting → Active → Ended`）
//! - ミュート・カメラ・チャットパネルの切り替えとチャット送信
//!
//! ## 終了処理
//!
//! 終了理由にかかわらず、また Drop 時にも次を保証する:
//! - `end-call` の送信は高々 1 回
//! - ウィジェットの破棄はちょうど 1 回
//! - ルームの購読を解除する

use std::sync::Arc;

use swaphere_server::{
    domain::{ChatMessage, MessageText, RoomId, Timestamp, UserId, UserProfile},
    infrastructure::dto::websocket::{
        CallUserPayload, ChatMessageDto, ClientEvent, ServerEvent, SignalPayload, UserRef,
    },
};
use swaphere_shared::time::Clock;
use tokio::sync::mpsc;

use crate::router::{EventRouter, RoomSubscription};

use super::{
    state::{CallError, CallState, EndReason},
    widget::{VideoWidget, WidgetCommand, WidgetConfig, WidgetEvent},
};

/// Events queued for the relay connection.
pub type Outbox = mpsc::UnboundedSender<ClientEvent>;

/// Input the controller reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerInput {
    Relay(ServerEvent),
    Widget(WidgetEvent),
}

/// What changed after handling an input, for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallUpdate {
    Activated,
    Message(ChatMessage),
    PeerUnreachable,
    Ended(EndReason),
}

pub struct CallController {
    local: UserProfile,
    peer: UserProfile,
    room_id: RoomId,
    state: CallState,
    outbox: Outbox,
    clock: Arc<dyn Clock>,
    widget: Option<Box<dyn VideoWidget>>,
    widget_events: Option<mpsc::UnboundedReceiver<WidgetEvent>>,
    subscription: Option<RoomSubscription>,
    joined_announced: bool,
    end_announced: bool,
    audio_muted: bool,
    video_muted: bool,
    chat_open: bool,
    transcript: Vec<ChatMessage>,
}

impl CallController {
    /// 通話を開始する
    ///
    /// 1. ルーム ID を計算
    /// 2. ルームのイベントを購読
    /// 3. `call-user` で発信を通知
    /// 4. ウィジェットを初期化
    ///
    /// ウィジェットの初期化に失敗した場合は `end-call` を送って購読を解除し、
    /// `CallError::WidgetInit` を返す。
    pub fn start(
        local: UserProfile,
        peer: UserProfile,
        router: &EventRouter,
        outbox: Outbox,
        clock: Arc<dyn Clock>,
        mut widget: Box<dyn VideoWidget>,
    ) -> Result<Self, CallError> {
        let room_id = RoomId::for_pair(&local.id, &peer.id).map_err(CallError::InvalidPeer)?;
        let subscription = router.subscribe(room_id.clone());

        send(
            &outbox,
            ClientEvent::CallUser(CallUserPayload {
                from: UserRef::from(local.clone()).into(),
                to: peer.id.to_string(),
                room_id: room_id.to_string(),
            }),
        );

        let config = WidgetConfig {
            display_name: local.name.clone(),
            email: local.email.clone(),
            start_with_audio_muted: false,
            start_with_video_muted: false,
            prejoin_page_enabled: false,
            remote_display_name: peer.name.clone(),
        };
        let widget_events = match widget.initialize(&room_id.widget_room_name(), &config) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Widget failed to start for {}: {}", room_id, e);
                send(&outbox, end_call_event(&local.id, &peer.id, &room_id));
                drop(subscription);
                return Err(CallError::WidgetInit(e));
            }
        };

        tracing::info!("Call {} started with '{}'", room_id, peer.id);
        Ok(Self {
            local,
            peer,
            room_id,
            state: CallState::Connecting,
            outbox,
            clock,
            widget: Some(widget),
            widget_events: Some(widget_events),
            subscription: Some(subscription),
            joined_announced: false,
            end_announced: false,
            audio_muted: config.start_with_audio_muted,
            video_muted: config.start_with_video_muted,
            chat_open: false,
            transcript: Vec::new(),
        })
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn peer(&self) -> &UserProfile {
        &self.peer
    }

    pub fn is_audio_muted(&self) -> bool {
        self.audio_muted
    }

    pub fn is_video_muted(&self) -> bool {
        self.video_muted
    }

    pub fn is_chat_open(&self) -> bool {
        self.chat_open
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Waits for the next relay or widget event of this call.
    ///
    /// Returns `None` once both sources are closed, which happens after the call ended.
    pub async fn next_input(&mut self) -> Option<ControllerInput> {
        let subscription = self.subscription.as_mut();
        let widget_events = self.widget_events.as_mut();
        tokio::select! {
            Some(event) = async move {
                match subscription {
                    Some(s) => s.recv().await,
                    None => None,
                }
            } => Some(ControllerInput::Relay(event)),
            Some(event) = async move {
                match widget_events {
                    Some(rx) => rx.recv().await,
                    None => None,
                }
            } => Some(ControllerInput::Widget(event)),
            else => None,
        }
    }

    pub fn handle(&mut self, input: ControllerInput) -> Option<CallUpdate> {
        match input {
            ControllerInput::Relay(event) => self.handle_relay_event(event),
            ControllerInput::Widget(event) => self.handle_widget_event(event),
        }
    }

    pub fn handle_relay_event(&mut self, event: ServerEvent) -> Option<CallUpdate> {
        if self.state.is_ended() {
            return None;
        }
        match RoomId::parse(event.room_id()) {
            Ok(room_id) if room_id == self.room_id => {}
            _ => return None,
        }

        match event {
            ServerEvent::CallAccepted(_) => self.activate(),
            ServerEvent::CallEnded(_) => self.finish(EndReason::PeerEnded),
            ServerEvent::Message(dto) => match ChatMessage::try_from(dto) {
                Ok(message) => {
                    self.transcript.push(message.clone());
                    Some(CallUpdate::Message(message))
                }
                Err(e) => {
                    tracing::warn!("Dropped malformed message in {}: {}", self.room_id, e);
                    None
                }
            },
            ServerEvent::IncomingCall(_) => {
                // Both sides called each other; this call already covers the room.
                tracing::debug!("Ignoring incoming-call for live room {}", self.room_id);
                None
            }
            ServerEvent::PeerUnreachable(_) => Some(CallUpdate::PeerUnreachable),
        }
    }

    pub fn handle_widget_event(&mut self, event: WidgetEvent) -> Option<CallUpdate> {
        if self.state.is_ended() {
            return None;
        }
        match event {
            WidgetEvent::VideoConferenceJoined => {
                if !self.joined_announced {
                    self.joined_announced = true;
                    send(
                        &self.outbox,
                        ClientEvent::CallJoined(SignalPayload {
                            from: self.local.id.to_string(),
                            to: self.peer.id.to_string(),
                            room_id: self.room_id.to_string(),
                        }),
                    );
                }
                self.activate()
            }
            WidgetEvent::ParticipantLeft => self.finish(EndReason::PeerLeft),
        }
    }

    /// `toggleAudio`。ウィジェットが受け付けた場合だけ状態を反転する。
    pub fn toggle_mute(&mut self) -> Result<bool, CallError> {
        self.execute(WidgetCommand::ToggleAudio)?;
        self.audio_muted = !self.audio_muted;
        Ok(self.audio_muted)
    }

    /// `toggleVideo`。ウィジェットが受け付けた場合だけ状態を反転する。
    pub fn toggle_video(&mut self) -> Result<bool, CallError> {
        self.execute(WidgetCommand::ToggleVideo)?;
        self.video_muted = !self.video_muted;
        Ok(self.video_muted)
    }

    pub fn toggle_chat(&mut self) -> bool {
        self.chat_open = !self.chat_open;
        self.chat_open
    }

    /// Sends a chat message and appends it to the local transcript right away.
    pub fn send_message(&mut self, text: &str) -> Result<ChatMessage, CallError> {
        if self.state.is_ended() {
            return Err(CallError::Ended);
        }
        let message = ChatMessage {
            sender_id: self.local.id.clone(),
            sender_name: self.local.name.clone(),
            text: MessageText::new(text.to_string()).map_err(CallError::InvalidMessage)?,
            timestamp: Timestamp::new(self.clock.now_utc_millis()),
            room_id: self.room_id.clone(),
        };
        send(
            &self.outbox,
            ClientEvent::SendMessage(ChatMessageDto::from(message.clone())),
        );
        self.transcript.push(message.clone());
        Ok(message)
    }

    pub fn end_call(&mut self) -> Option<CallUpdate> {
        self.finish(EndReason::LocalEnd)
    }

    pub fn transport_lost(&mut self) -> Option<CallUpdate> {
        self.finish(EndReason::TransportLost)
    }

    fn execute(&mut self, command: WidgetCommand) -> Result<(), CallError> {
        if self.state.is_ended() {
            return Err(CallError::Ended);
        }
        let widget = self.widget.as_mut().ok_or(CallError::Ended)?;
        widget.execute_command(command).map_err(CallError::Widget)
    }

    fn activate(&mut self) -> Option<CallUpdate> {
        match self.state {
            CallState::Connecting => {
                self.state = CallState::Active;
                tracing::info!("Call {} is active", self.room_id);
                Some(CallUpdate::Activated)
            }
            _ => None,
        }
    }

    /// Ends the call once; later calls are no-ops.
    fn finish(&mut self, reason: EndReason) -> Option<CallUpdate> {
        if self.state.is_ended() {
            return None;
        }
        self.state = CallState::Ended(reason);

        if !self.end_announced {
            self.end_announced = true;
            send(
                &self.outbox,
                end_call_event(&self.local.id, &self.peer.id, &self.room_id),
            );
        }
        if let Some(mut widget) = self.widget.take() {
            widget.dispose();
        }
        self.widget_events = None;
        self.subscription = None;

        tracing::info!("Call {} ended: {}", self.room_id, reason);
        Some(CallUpdate::Ended(reason))
    }
}

impl Drop for CallController {
    fn drop(&mut self) {
        self.finish(EndReason::LocalEnd);
    }
}

fn end_call_event(from: &UserId, to: &UserId, room_id: &RoomId) -> ClientEvent {
    ClientEvent::EndCall(SignalPayload {
        from: from.to_string(),
        to: to.to_string(),
        room_id: room_id.to_string(),
    })
}

/// Best effort: the outbox is gone only when the connection is.
fn send(outbox: &Outbox, event: ClientEvent) {
    if let Err(e) = outbox.send(event) {
        tracing::debug!("Relay connection closed, dropped {}", e.0.name());
    }
}
