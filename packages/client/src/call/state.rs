//! Call state and errors.

use std::fmt;

use swaphere_server::domain::ValueObjectError;
use thiserror::Error;

use super::widget::WidgetError;

/// Why a call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The peer sent `end-call`.
    PeerEnded,
    /// The widget reported that the peer left the conference.
    PeerLeft,
    /// `/end`, or the controller was dropped.
    LocalEnd,
    /// The relay connection went away.
    TransportLost,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EndReason::PeerEnded => "the other person ended the call",
            EndReason::PeerLeft => "the other person left",
            EndReason::LocalEnd => "you ended the call",
            EndReason::TransportLost => "connection to the relay was lost",
        };
        f.write_str(text)
    }
}

/// `Connecting → Active → Ended`. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Connecting,
    Active,
    Ended(EndReason),
}

impl CallState {
    pub fn is_ended(&self) -> bool {
        matches!(self, CallState::Ended(_))
    }
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("cannot call '{0}'")]
    InvalidPeer(#[source] ValueObjectError),

    /// The video widget could not be created. The call can be retried.
    #[error("video widget failed to start: {0}")]
    WidgetInit(#[source] WidgetError),

    #[error("video widget rejected the command: {0}")]
    Widget(#[source] WidgetError),

    #[error("invalid message: {0}")]
    InvalidMessage(#[source] ValueObjectError),

    #[error("the call has already ended")]
    Ended,
}
