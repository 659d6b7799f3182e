//! WebSocket client session management.

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use swaphere_server::{
    domain::{ChatMessage, MessageText, RoomId, Timestamp, UserId, UserProfile, ValueObjectError},
    infrastructure::dto::{
        http::OnlineUsersDto,
        websocket::{ChatMessageDto, ClientEvent, ServerEvent, SignalPayload},
    },
};
use swaphere_shared::time::{Clock, SystemClock};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message},
};

use crate::{
    call::{
        CallController, CallError, CallUpdate, ControllerInput, HeadlessWidget, JoinTrigger,
        Outbox,
    },
    command::{self, Command},
    config::ClientConfig,
    domain::http_base_url,
    error::ClientError,
    formatter::MessageFormatter,
    router::EventRouter,
    ui::redisplay_prompt,
};

/// Whether the input loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run one relay connection until the user quits or the connection drops
///
/// # Returns
///
/// * `Ok(())` - the user quit
/// * `Err(ClientError::AuthRejected)` - the relay refused the credential
/// * `Err(ClientError::ConnectionError)` - connecting failed
/// * `Err(ClientError::ConnectionLost)` - the connection dropped after it was established
pub async fn run_client_session(
    config: &ClientConfig,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(config.connect_url())
        .await
        .map_err(connect_error)?;

    tracing::info!("Connected to relay!");
    println!(
        "\nYou are '{}' ({}). Type /help for commands. Press Ctrl+C to exit.\n",
        config.display_name, config.user_id
    );

    let (mut write, mut read) = ws_stream.split();
    let (router, mut fallback_rx) = EventRouter::new();
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<ClientEvent>();

    // Spawn a task to route incoming events
    let reader_router = router.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(text.as_str()) {
                    Ok(event) => reader_router.route(event),
                    Err(e) => tracing::warn!("Ignoring unknown frame: {}", e),
                },
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to drain the outbox into the socket
    let mut write_task = tokio::spawn(async move {
        while let Some(event) = outbox_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize {}: {}", event.name(), e);
                    continue;
                }
            };
            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send {}: {}", event.name(), e);
                return;
            }
        }
        let _ = write.close().await;
    });

    let mut session = Session::new(config, router, outbox, Arc::new(SystemClock));
    redisplay_prompt(config.user_id.as_str());

    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let flow = match line {
                    Some(line) => session.handle_line(&line).await,
                    None => Flow::Quit,
                };
                if flow == Flow::Quit {
                    break;
                }
                redisplay_prompt(config.user_id.as_str());
            }
            Some(event) = fallback_rx.recv() => {
                session.handle_unrouted(event);
                redisplay_prompt(config.user_id.as_str());
            }
            input = next_call_input(&mut session.call) => {
                session.handle_call_input(input);
                redisplay_prompt(config.user_id.as_str());
            }
            _ = &mut read_task => {
                session.connection_lost();
                write_task.abort();
                return Err(ClientError::ConnectionLost("relay closed the connection".to_string()));
            }
            _ = &mut write_task => {
                session.connection_lost();
                read_task.abort();
                return Err(ClientError::ConnectionLost("relay closed the connection".to_string()));
            }
        }
    }

    // Ending the call queues end-call; dropping the session closes the outbox.
    session.end_call();
    drop(session);
    if tokio::time::timeout(Duration::from_secs(1), &mut write_task)
        .await
        .is_err()
    {
        write_task.abort();
    }
    read_task.abort();

    Ok(())
}

fn connect_error(error: tungstenite::Error) -> ClientError {
    match error {
        tungstenite::Error::Http(response) => http_rejection(
            response.status().as_u16(),
            response.body().as_ref().map(|body| &body[..]),
        ),
        other => ClientError::ConnectionError(other.to_string()),
    }
}

/// Maps a refused upgrade to a client error. Only 401 is an auth rejection.
fn http_rejection(status: u16, body: Option<&[u8]>) -> ClientError {
    if status != 401 {
        return ClientError::ConnectionError(format!("upgrade refused with HTTP {}", status));
    }
    let reason = body
        .and_then(|body| std::str::from_utf8(body).ok())
        .filter(|reason| !reason.is_empty())
        .unwrap_or("unauthorized");
    ClientError::AuthRejected(reason.to_string())
}

/// Next input of the live call; pends forever when there is none.
async fn next_call_input(call: &mut Option<CallController>) -> Option<ControllerInput> {
    match call {
        Some(controller) => controller.next_input().await,
        None => std::future::pending().await,
    }
}

/// Call and chat state of one connection.
struct Session {
    me: UserProfile,
    http_base: Option<String>,
    widget_base_url: String,
    router: EventRouter,
    outbox: Outbox,
    clock: Arc<dyn Clock>,
    call: Option<CallController>,
    /// Confirms the local join to the live call's widget.
    join_trigger: Option<JoinTrigger>,
    /// Incoming calls not answered yet, oldest first.
    pending: Vec<UserProfile>,
    /// Chat partner outside a call.
    conversation: Option<UserProfile>,
}

impl Session {
    fn new(config: &ClientConfig, router: EventRouter, outbox: Outbox, clock: Arc<dyn Clock>) -> Self {
        Self {
            me: config.profile(),
            http_base: http_base_url(&config.url),
            widget_base_url: config.widget_base_url.clone(),
            router,
            outbox,
            clock,
            call: None,
            join_trigger: None,
            pending: Vec::new(),
            conversation: None,
        }
    }

    async fn handle_line(&mut self, line: &str) -> Flow {
        let command = match command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                println!("{}", e);
                return Flow::Continue;
            }
        };

        match command {
            Command::Call { user_id, name } => match UserId::new(user_id) {
                Ok(id) => {
                    let peer = match name {
                        Some(name) => UserProfile::new(id, name),
                        None => UserProfile::minimal(id),
                    };
                    self.start_call(peer);
                }
                Err(e) => println!("Cannot call: {}", e),
            },
            Command::Accept(user_id) => match self.take_pending(user_id.as_deref()) {
                Some(caller) => self.start_call(caller),
                None => println!("No incoming call to accept"),
            },
            Command::Decline(user_id) => match self.take_pending(user_id.as_deref()) {
                Some(caller) => self.decline(caller),
                None => println!("No incoming call to decline"),
            },
            Command::Join => {
                let joined = self.join_trigger.as_ref().is_some_and(JoinTrigger::join);
                if !joined {
                    println!("Not in a call");
                }
            }
            Command::Mute => self.with_call(|call| {
                call.toggle_mute()
                    .map(|muted| MessageFormatter::format_toggle("Microphone muted", muted))
            }),
            Command::Video => self.with_call(|call| {
                call.toggle_video()
                    .map(|off| MessageFormatter::format_toggle("Camera off", off))
            }),
            Command::Chat => self.with_call(|call| {
                let open = call.toggle_chat();
                let mut output = MessageFormatter::format_toggle("Chat panel", open);
                if open {
                    for message in call.transcript() {
                        output.push_str(&MessageFormatter::format_transcript_entry(message));
                    }
                }
                Ok(output)
            }),
            Command::End => {
                if self.call.is_none() {
                    println!("Not in a call");
                }
                self.end_call();
            }
            Command::Who => self.print_online_users().await,
            Command::Help => println!("{}", MessageFormatter::format_help()),
            Command::Quit => return Flow::Quit,
            Command::Say(text) => self.say(&text),
        }
        Flow::Continue
    }

    fn start_call(&mut self, peer: UserProfile) {
        if let Some(call) = &self.call {
            println!(
                "Already in a call with {}; /end it first",
                call.peer().name
            );
            return;
        }
        self.pending.retain(|caller| caller.id != peer.id);

        let peer_id = peer.id.clone();
        let widget = HeadlessWidget::new(self.widget_base_url.clone());
        let join_trigger = widget.join_trigger();
        match CallController::start(
            self.me.clone(),
            peer.clone(),
            &self.router,
            self.outbox.clone(),
            self.clock.clone(),
            Box::new(widget),
        ) {
            Ok(controller) => {
                println!("\n* Calling {}...", peer.name);
                self.conversation = Some(peer);
                self.call = Some(controller);
                self.join_trigger = Some(join_trigger);
            }
            Err(CallError::WidgetInit(e)) => {
                println!(
                    "\n* Could not start video ({}). Try again with /call {}",
                    e, peer_id
                );
            }
            Err(e) => println!("\n* Cannot call {}: {}", peer_id, e),
        }
    }

    fn decline(&mut self, caller: UserProfile) {
        match RoomId::for_pair(&self.me.id, &caller.id) {
            Ok(room_id) => {
                let _ = self.outbox.send(ClientEvent::EndCall(SignalPayload {
                    from: self.me.id.to_string(),
                    to: caller.id.to_string(),
                    room_id: room_id.to_string(),
                }));
                println!("\n* Declined call from {}", caller.name);
            }
            Err(e) => tracing::warn!("Cannot decline '{}': {}", caller.id, e),
        }
    }

    fn take_pending(&mut self, user_id: Option<&str>) -> Option<UserProfile> {
        let index = match user_id {
            Some(id) => self.pending.iter().position(|c| c.id.as_str() == id)?,
            None => self.pending.len().checked_sub(1)?,
        };
        Some(self.pending.remove(index))
    }

    fn with_call<F>(&mut self, f: F)
    where
        F: FnOnce(&mut CallController) -> Result<String, CallError>,
    {
        match self.call.as_mut() {
            Some(call) => match f(call) {
                Ok(output) => print!("{}", output),
                Err(e) => println!("{}", e),
            },
            None => println!("Not in a call"),
        }
    }

    fn say(&mut self, text: &str) {
        if let Some(call) = self.call.as_mut() {
            match call.send_message(text) {
                Ok(message) => print!("{}", MessageFormatter::format_transcript_entry(&message)),
                Err(e) => println!("{}", e),
            }
            return;
        }

        let Some(peer) = self.conversation.clone() else {
            println!("Nobody to talk to yet: /call <userId> first");
            return;
        };
        match self.chat_message(&peer, text) {
            Ok(message) => {
                let _ = self
                    .outbox
                    .send(ClientEvent::SendMessage(ChatMessageDto::from(message.clone())));
                print!("{}", MessageFormatter::format_transcript_entry(&message));
            }
            Err(e) => println!("Cannot send: {}", e),
        }
    }

    fn chat_message(&self, peer: &UserProfile, text: &str) -> Result<ChatMessage, ValueObjectError> {
        Ok(ChatMessage {
            sender_id: self.me.id.clone(),
            sender_name: self.me.name.clone(),
            text: MessageText::new(text.to_string())?,
            timestamp: Timestamp::new(self.clock.now_utc_millis()),
            room_id: RoomId::for_pair(&self.me.id, &peer.id)?,
        })
    }

    async fn print_online_users(&self) {
        let Some(base) = &self.http_base else {
            println!("Presence is not available for this relay URL");
            return;
        };
        let result = async {
            reqwest::get(format!("{}/api/presence", base))
                .await?
                .error_for_status()?
                .json::<OnlineUsersDto>()
                .await
        }
        .await;
        match result {
            Ok(dto) => print!(
                "{}",
                MessageFormatter::format_online_users(&dto.online, self.me.id.as_str())
            ),
            Err(e) => println!("Could not fetch presence: {}", e),
        }
    }

    /// Events for rooms without a live call.
    fn handle_unrouted(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::IncomingCall(payload) => {
                match UserProfile::try_from(payload.from.clone()) {
                    Ok(caller) => {
                        print!("{}", MessageFormatter::format_incoming_call(&payload.from));
                        self.pending.retain(|c| c.id != caller.id);
                        self.pending.push(caller);
                    }
                    Err(e) => tracing::warn!("Ignoring incoming call: {}", e),
                }
            }
            ServerEvent::CallEnded(payload) => {
                if let Some(index) = self.pending.iter().position(|c| c.id.as_str() == payload.from) {
                    let caller = self.pending.remove(index);
                    println!("\n* Missed call from {}", caller.name);
                }
            }
            ServerEvent::Message(dto) => match ChatMessage::try_from(dto) {
                Ok(message) => {
                    print!("{}", MessageFormatter::format_transcript_entry(&message));
                    if self.call.is_none() {
                        self.conversation = Some(UserProfile::new(
                            message.sender_id.clone(),
                            message.sender_name.clone(),
                        ));
                    }
                }
                Err(e) => tracing::warn!("Ignoring malformed message: {}", e),
            },
            ServerEvent::PeerUnreachable(payload) => {
                println!("\n* {} is offline right now", payload.to);
            }
            ServerEvent::CallAccepted(payload) => {
                tracing::debug!("Stale call-accepted for {}", payload.room_id);
            }
        }
    }

    fn handle_call_input(&mut self, input: Option<ControllerInput>) {
        let Some(input) = input else {
            self.call = None;
            return;
        };
        let Some(call) = self.call.as_mut() else {
            return;
        };
        if let Some(update) = call.handle(input) {
            print!(
                "{}",
                MessageFormatter::format_call_update(&update, &call.peer().name)
            );
            if matches!(update, CallUpdate::Ended(_)) {
                self.call = None;
            }
        }
    }

    fn end_call(&mut self) {
        if let Some(mut call) = self.call.take() {
            let update = call.end_call();
            Self::print_update(&call, update);
        }
    }

    fn connection_lost(&mut self) {
        if let Some(mut call) = self.call.take() {
            let update = call.transport_lost();
            Self::print_update(&call, update);
        }
    }

    fn print_update(call: &CallController, update: Option<CallUpdate>) {
        if let Some(update) = update {
            print!(
                "{}",
                MessageFormatter::format_call_update(&update, &call.peer().name)
            );
        }
    }
}
