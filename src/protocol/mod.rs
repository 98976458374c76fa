//! Wire protocol codec
//!
//! The engine consumes decoded command arrays and produces [`RespValue`]
//! replies; this module is the boundary that turns a byte stream into those
//! structured values and back (RESP2 framing).

mod resp;
mod types;

pub use resp::{RespEncoder, RespParser};
pub use types::{RespError, RespValue};
