//! Front-end inter-task channels.
//!
//! Uses `embassy-sync` bounded MPMC channels to hand decoded frames from a
//! front end running in its own task (the socket listener) to the driver
//! loop, and replies back. No heap allocation.
//!
//! ```text
//! ┌──────────────┐ FrontEndRequest ┌──────────────┐
//! │  Front end   │───────────────▶│  Driver loop  │
//! │  (socket)    │◀───────────────│  (sync)       │
//! └──────────────┘  FrontEndReply  └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::ports::{AnalogSampler, ExpanderBus};

use super::pdu::PduBuf;
use super::server::{FrontEnd, ModbusServer};

/// A decoded frame waiting for execution.
#[derive(Debug, Clone)]
pub struct FrontEndRequest {
    pub front_end: FrontEnd,
    /// Transaction identifier echoed back to the client (TCP), 0 for RTU.
    pub transaction_id: u16,
    pub unit_id: u8,
    pub pdu: PduBuf,
}

/// A reply ready for framing by its front end.
#[derive(Debug, Clone)]
pub struct FrontEndReply {
    pub front_end: FrontEnd,
    pub transaction_id: u16,
    pub unit_id: u8,
    pub pdu: PduBuf,
}

/// Channel depth for inbound requests.
pub const REQUEST_DEPTH: usize = 8;

/// Channel depth for outbound replies.
pub const REPLY_DEPTH: usize = 8;

pub type RequestChannel<M> = Channel<M, FrontEndRequest, REQUEST_DEPTH>;
pub type ReplyChannel<M> = Channel<M, FrontEndReply, REPLY_DEPTH>;

/// Inbound request channel: front ends → driver loop.
pub static REQUEST_CHANNEL: RequestChannel<CriticalSectionRawMutex> = Channel::new();

/// Outbound reply channel: driver loop → front ends.
pub static REPLY_CHANNEL: ReplyChannel<CriticalSectionRawMutex> = Channel::new();

/// Execute up to `budget` queued requests without blocking.
///
/// Requests are applied in queue order. A reply that does not fit in the
/// reply channel is dropped with a warning; the client times out and
/// retries. Returns how many requests were executed.
pub fn service_requests<CM, M, B, S>(
    server: &ModbusServer<'_, M, B, S>,
    requests: &Channel<CM, FrontEndRequest, REQUEST_DEPTH>,
    replies: &Channel<CM, FrontEndReply, REPLY_DEPTH>,
    budget: usize,
) -> usize
where
    CM: RawMutex,
    M: RawMutex,
    B: ExpanderBus,
    S: AnalogSampler,
{
    let mut served = 0;
    while served < budget {
        let Ok(req) = requests.try_receive() else {
            break;
        };
        served += 1;

        let Some(pdu) = server.handle_pdu(req.front_end, req.unit_id, &req.pdu) else {
            continue;
        };
        let reply = FrontEndReply {
            front_end: req.front_end,
            transaction_id: req.transaction_id,
            unit_id: req.unit_id,
            pdu,
        };
        if replies.try_send(reply).is_err() {
            warn!(
                "{}: reply channel full, dropped reply to transaction {}",
                req.front_end, req.transaction_id
            );
        }
    }
    served
}
