//! Messaging channels: inbound payload normalization and outbound responders.
//!
//! Webhook bodies are normalized into `InboundMessage`s (or filtered by the
//! anti-loop rules); replies and menus go out through a `Responder`.

mod inbound;
mod normalize;
mod responder;

pub use inbound::{InboundMessage, OriginChannel};
pub use normalize::{
    normalize_sender, FilterReason, IgnoreReason, LoopGuard, Normalized, PayloadNormalizer,
};
pub use responder::{HttpResponder, LogResponder, MenuOption, MenuPayload, Responder};
