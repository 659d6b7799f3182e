//! Client Call Controller
//!
//! 通話 1 件につき 1 つの `CallController` を作り、シグナリング・ビデオウィジェット・
//! チャットをまとめて管理する。

pub mod controller;
pub mod state;
pub mod widget;

pub use controller::{CallController, CallUpdate, ControllerInput, Outbox};
pub use state::{CallError, CallState, EndReason};
pub use widget::{
    HeadlessWidget, JoinTrigger, VideoWidget, WidgetCommand, WidgetConfig, WidgetError,
    WidgetEvent,
};
