//! Video widget port.
//!
//! The conference itself runs in an external widget (Jitsi Meet in the web
//! client). The controller owns one widget instance per call: it initializes it
//! when the call starts and disposes it when the call ends.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    #[error("initialization failed: {0}")]
    InitFailed(String),

    #[error("command '{0}' was rejected")]
    CommandRejected(&'static str),

    #[error("widget is not running")]
    NotRunning,
}

/// Options passed to the widget on initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub display_name: String,
    pub email: Option<String>,
    pub start_with_audio_muted: bool,
    pub start_with_video_muted: bool,
    pub prejoin_page_enabled: bool,
    /// Name shown for the other participant.
    pub remote_display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetCommand {
    ToggleAudio,
    ToggleVideo,
}

impl WidgetCommand {
    pub fn name(&self) -> &'static str {
        match self {
            WidgetCommand::ToggleAudio => "toggleAudio",
            WidgetCommand::ToggleVideo => "toggleVideo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    VideoConferenceJoined,
    ParticipantLeft,
}

/// Capability to host a two-party video conference.
#[cfg_attr(test, mockall::automock)]
pub trait VideoWidget: Send {
    /// Starts the conference in `room_name`; widget events arrive on the returned channel.
    fn initialize(
        &mut self,
        room_name: &str,
        config: &WidgetConfig,
    ) -> Result<mpsc::UnboundedReceiver<WidgetEvent>, WidgetError>;

    fn execute_command(&mut self, command: WidgetCommand) -> Result<(), WidgetError>;

    fn dispose(&mut self);
}

type EventSender = Arc<Mutex<Option<mpsc::UnboundedSender<WidgetEvent>>>>;

/// Terminal stand-in for the embedded widget.
///
/// Prints the conference link instead of rendering it. A terminal cannot see
/// the browser tab, so the local participant counts as joined only once the
/// user confirms through a [`JoinTrigger`].
pub struct HeadlessWidget {
    base_url: String,
    events: EventSender,
}

impl HeadlessWidget {
    pub const DEFAULT_BASE_URL: &'static str = "https://meet.jit.si";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            events: Arc::new(Mutex::new(None)),
        }
    }

    pub fn conference_url(&self, room_name: &str) -> String {
        format!("{}/{}", self.base_url, room_name)
    }

    /// Handle that reports `VideoConferenceJoined` for this widget.
    pub fn join_trigger(&self) -> JoinTrigger {
        JoinTrigger {
            events: self.events.clone(),
        }
    }

    fn is_running(&self) -> bool {
        lock(&self.events).is_some()
    }
}

impl Default for HeadlessWidget {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

impl VideoWidget for HeadlessWidget {
    fn initialize(
        &mut self,
        room_name: &str,
        config: &WidgetConfig,
    ) -> Result<mpsc::UnboundedReceiver<WidgetEvent>, WidgetError> {
        if room_name.is_empty() {
            return Err(WidgetError::InitFailed("empty room name".to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        println!(
            "\nJoin the video call as {}: {}\nType /join once you are in.",
            config.display_name,
            self.conference_url(room_name)
        );
        *lock(&self.events) = Some(tx);
        Ok(rx)
    }

    fn execute_command(&mut self, command: WidgetCommand) -> Result<(), WidgetError> {
        if !self.is_running() {
            return Err(WidgetError::NotRunning);
        }
        tracing::debug!("Widget command {}", command.name());
        Ok(())
    }

    fn dispose(&mut self) {
        if lock(&self.events).take().is_some() {
            tracing::debug!("Widget disposed");
        }
    }
}

/// Reports the local participant as joined to a running [`HeadlessWidget`].
#[derive(Clone)]
pub struct JoinTrigger {
    events: EventSender,
}

impl JoinTrigger {
    /// Returns `false` when the widget is not running.
    pub fn join(&self) -> bool {
        lock(&self.events)
            .as_ref()
            .is_some_and(|tx| tx.send(WidgetEvent::VideoConferenceJoined).is_ok())
    }
}

fn lock(
    events: &EventSender,
) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<WidgetEvent>>> {
    events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WidgetConfig {
        WidgetConfig {
            display_name: "Ada".to_string(),
            email: None,
            start_with_audio_muted: false,
            start_with_video_muted: false,
            prejoin_page_enabled: false,
            remote_display_name: "Grace".to_string(),
        }
    }

    #[tokio::test]
    async fn test_headless_widget_reports_joined_on_trigger() {
        // テスト項目: 初期化だけでは参加扱いにならず、/join の確認で参加イベントが通知される
        // given (前提条件):
        let mut widget = HeadlessWidget::default();
        let trigger = widget.join_trigger();
        let mut events = widget.initialize("swapHereu1u2", &config()).unwrap();
        assert!(events.try_recv().is_err());

        // when (操作):
        let joined = trigger.join();

        // then (期待する結果):
        assert!(joined);
        assert_eq!(events.recv().await, Some(WidgetEvent::VideoConferenceJoined));
        assert_eq!(
            widget.conference_url("swapHereu1u2"),
            "https://meet.jit.si/swapHereu1u2"
        );
    }

    #[tokio::test]
    async fn test_headless_widget_rejects_commands_after_dispose() {
        // テスト項目: 破棄後のコマンドと参加確認は拒否され、イベントチャンネルは閉じる
        // given (前提条件):
        let mut widget = HeadlessWidget::new("https://meet.example/");
        let trigger = widget.join_trigger();
        let mut events = widget.initialize("swapHereu1u2", &config()).unwrap();
        assert!(widget.execute_command(WidgetCommand::ToggleAudio).is_ok());

        // when (操作):
        widget.dispose();

        // then (期待する結果):
        assert_eq!(
            widget.execute_command(WidgetCommand::ToggleVideo),
            Err(WidgetError::NotRunning)
        );
        assert!(!trigger.join());
        assert_eq!(events.recv().await, None);
    }

    #[test]
    fn test_join_before_initialize_is_refused() {
        // テスト項目: 初期化前の参加確認は失敗する
        // given (前提条件):
        let widget = HeadlessWidget::default();

        // when (操作):
        let joined = widget.join_trigger().join();

        // then (期待する結果):
        assert!(!joined);
    }
}
