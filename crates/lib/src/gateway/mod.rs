//! Gateway: HTTP surface for the assistant.
//!
//! Single port. `POST /webhook` takes raw events from the messaging gateway and
//! the web widget; `POST /simulate` answers plain (user, message) pairs.

pub mod protocol;
mod server;

pub use protocol::{Ack, AckStatus, ReloadReply, SimulateParams, SimulateReply};
pub use server::{router, run_gateway, GatewayState};
