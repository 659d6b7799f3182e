//! Utilities shared by the swapHere relay server and the call client.

pub mod logger;
pub mod time;
