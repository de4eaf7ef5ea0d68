//! Request execution shared by both front ends.
//!
//! The serial (RTU) and socket (TCP) front ends do their own framing and
//! CRC, then hand a unit id and a PDU to [`ModbusServer`]. Both front ends
//! share one server and therefore one set of stores.

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use log::debug;

use crate::app::ports::{AnalogSampler, ExpanderBus};
use crate::io::SharedIo;

use super::bridge;
use super::pdu::{PduBuf, Request, exception_pdu};

/// Unit id addressed by broadcast writes.
pub const BROADCAST_UNIT: u8 = 0;

/// Which front end a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontEnd {
    /// Frame-oriented serial line.
    Rtu,
    /// Socket front end.
    Tcp,
}

impl fmt::Display for FrontEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rtu => write!(f, "RTU"),
            Self::Tcp => write!(f, "TCP"),
        }
    }
}

pub struct ModbusServer<'a, M: RawMutex, B, S> {
    io: &'a SharedIo<M, B, S>,
    unit_id: u8,
}

impl<'a, M, B, S> ModbusServer<'a, M, B, S>
where
    M: RawMutex,
    B: ExpanderBus,
    S: AnalogSampler,
{
    pub fn new(io: &'a SharedIo<M, B, S>, unit_id: u8) -> Self {
        Self { io, unit_id }
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    /// Execute a parsed request addressed to `unit`.
    ///
    /// Returns the reply PDU, or `None` when nothing is sent back: the
    /// request was for another unit, or it was a broadcast.
    pub fn handle(&self, front_end: FrontEnd, unit: u8, request: &Request) -> Option<PduBuf> {
        let broadcast = unit == BROADCAST_UNIT;
        if !broadcast && unit != self.unit_id {
            return None;
        }
        if broadcast && !request.function().is_write() {
            debug!("{}: read request broadcast, dropped", front_end);
            return None;
        }

        let reply = match bridge::dispatch(self.io, request) {
            Ok(response) => response.encode(),
            Err(code) => {
                debug!("{}: {:?} -> {}", front_end, request.function(), code);
                exception_pdu(request.function().into(), code)
            }
        };
        (!broadcast).then_some(reply)
    }

    /// Decode a raw PDU and execute it.
    ///
    /// An empty PDU gets no reply; any other decode failure is answered
    /// with an exception echoing the received function byte.
    pub fn handle_pdu(&self, front_end: FrontEnd, unit: u8, pdu: &[u8]) -> Option<PduBuf> {
        if unit != BROADCAST_UNIT && unit != self.unit_id {
            return None;
        }
        match Request::decode(pdu) {
            Ok(request) => self.handle(front_end, unit, &request),
            Err(code) => {
                let &function = pdu.first()?;
                debug!("{}: undecodable PDU (fc 0x{:02X}) -> {}", front_end, function, code);
                (unit != BROADCAST_UNIT).then(|| exception_pdu(function, code))
            }
        }
    }
}
