//! Protocol bridge: one handler per function code.
//!
//! | Function                 | Store              | Side effect            |
//! |--------------------------|--------------------|------------------------|
//! | read coils               | output bits        |                        |
//! | read discrete inputs     | input bits         |                        |
//! | read holding registers   | virtual registers  |                        |
//! | read input registers     | analog cache       |                        |
//! | write single coil        | output bits        | synchronous flush      |
//! | write multiple coils     | output bits        | synchronous flush      |
//! | write single register    | virtual registers  |                        |
//! | write multiple registers | virtual registers  | all-or-nothing commit  |
//!
//! Handlers hold no state of their own. Capacity always comes from the
//! addressed store's own count, and every check happens under the same
//! lock as the access it guards.

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;

use crate::app::ports::{AnalogSampler, ExpanderBus};
use crate::io::SharedIo;
use crate::io::expander::Space;

use super::pdu::{
    COIL_OFF, COIL_ON, ExceptionCode, FunctionCode, MAX_READ_BITS, MAX_READ_REGISTERS,
    MAX_WRITE_COILS, MAX_WRITE_REGISTERS, Request, Response,
};

type HandlerResult = Result<Response, ExceptionCode>;

/// `start + count` must fit inside `capacity`.
fn check_range(start: u16, count: u16, capacity: usize) -> Result<(), ExceptionCode> {
    if usize::from(start) + usize::from(count) > capacity {
        Err(ExceptionCode::IllegalDataAddress)
    } else {
        Ok(())
    }
}

fn check_quantity(count: u16, max: u16) -> Result<(), ExceptionCode> {
    if (1..=max).contains(&count) {
        Ok(())
    } else {
        Err(ExceptionCode::IllegalDataValue)
    }
}

// ── Reads ─────────────────────────────────────────────────────

fn read_bits<M, B, S>(
    io: &SharedIo<M, B, S>,
    function: FunctionCode,
    space: Space,
    start: u16,
    count: u16,
) -> HandlerResult
where
    M: RawMutex,
    B: ExpanderBus,
{
    io.with_expander(|bank| {
        let capacity = match space {
            Space::Input => bank.input_count(),
            Space::Output => bank.output_count(),
        };
        check_range(start, count, capacity)?;
        check_quantity(count, MAX_READ_BITS)?;

        let mut packed: Vec<u8, { MAX_READ_BITS as usize / 8 }> = Vec::new();
        packed
            .resize(usize::from(count).div_ceil(8), 0)
            .map_err(|()| ExceptionCode::IllegalDataValue)?;
        for i in 0..usize::from(count) {
            let bit = bank
                .read_bit(space, usize::from(start) + i)
                .map_err(|_| ExceptionCode::IllegalDataAddress)?;
            if bit {
                packed[i / 8] |= 1 << (i % 8);
            }
        }
        Ok(Response::Bits { function, packed })
    })
}

pub fn read_coils<M: RawMutex, B: ExpanderBus, S>(
    io: &SharedIo<M, B, S>,
    start: u16,
    count: u16,
) -> HandlerResult {
    read_bits(io, FunctionCode::ReadCoils, Space::Output, start, count)
}

pub fn read_discrete_inputs<M: RawMutex, B: ExpanderBus, S>(
    io: &SharedIo<M, B, S>,
    start: u16,
    count: u16,
) -> HandlerResult {
    read_bits(io, FunctionCode::ReadDiscreteInputs, Space::Input, start, count)
}

pub fn read_holding_registers<M: RawMutex, B, S>(
    io: &SharedIo<M, B, S>,
    start: u16,
    count: u16,
) -> HandlerResult {
    io.with_registers(|regs| {
        check_range(start, count, regs.len())?;
        check_quantity(count, MAX_READ_REGISTERS)?;
        let words = (start..start + count)
            .map(|i| regs.read(usize::from(i)))
            .collect();
        Ok(Response::Registers {
            function: FunctionCode::ReadHoldingRegisters,
            words,
        })
    })
}

pub fn read_input_registers<M: RawMutex, B, S: AnalogSampler>(
    io: &SharedIo<M, B, S>,
    start: u16,
    count: u16,
) -> HandlerResult {
    io.with_analog(|cache| {
        check_range(start, count, cache.len())?;
        check_quantity(count, MAX_READ_REGISTERS)?;
        let words = (start..start + count)
            .map(|i| cache.read(usize::from(i)))
            .collect();
        Ok(Response::Registers {
            function: FunctionCode::ReadInputRegisters,
            words,
        })
    })
}

// ── Writes ────────────────────────────────────────────────────

pub fn write_single_coil<M: RawMutex, B: ExpanderBus, S>(
    io: &SharedIo<M, B, S>,
    address: u16,
    value: u16,
) -> HandlerResult {
    io.with_expander(|bank| {
        check_range(address, 1, bank.output_count())?;
        let on = match value {
            COIL_ON => true,
            COIL_OFF => false,
            _ => return Err(ExceptionCode::IllegalDataValue),
        };
        bank.write_bit(usize::from(address), on);
        bank.flush_outputs();
        Ok(Response::WriteSingle {
            function: FunctionCode::WriteSingleCoil,
            address,
            value,
        })
    })
}

/// Byte/coil consistency is checked before the address range.
pub fn write_multiple_coils<M: RawMutex, B: ExpanderBus, S>(
    io: &SharedIo<M, B, S>,
    start: u16,
    count: u16,
    byte_count: u8,
    payload: &[u8],
) -> HandlerResult {
    if usize::from(count) > usize::from(byte_count) * 8 || payload.len() < usize::from(byte_count) {
        return Err(ExceptionCode::IllegalDataValue);
    }
    io.with_expander(|bank| {
        check_range(start, count, bank.output_count())?;
        check_quantity(count, MAX_WRITE_COILS)?;
        for i in 0..usize::from(count) {
            let on = payload[i / 8] & (1 << (i % 8)) != 0;
            bank.write_bit(usize::from(start) + i, on);
        }
        bank.flush_outputs();
        Ok(Response::WriteMultiple {
            function: FunctionCode::WriteMultipleCoils,
            start,
            count,
        })
    })
}

pub fn write_single_register<M: RawMutex, B, S>(
    io: &SharedIo<M, B, S>,
    address: u16,
    value: u16,
) -> HandlerResult {
    io.with_registers(|regs| {
        check_range(address, 1, regs.len())?;
        regs.write(usize::from(address), value);
        Ok(Response::WriteSingle {
            function: FunctionCode::WriteSingleRegister,
            address,
            value,
        })
    })
}

/// Every word is validated and decoded before the first one is committed;
/// the commit itself happens under a single lock.
pub fn write_multiple_registers<M: RawMutex, B, S>(
    io: &SharedIo<M, B, S>,
    start: u16,
    count: u16,
    byte_count: u8,
    payload: &[u8],
) -> HandlerResult {
    io.with_registers(|regs| {
        check_range(start, count, regs.len())?;
        check_quantity(count, MAX_WRITE_REGISTERS)?;
        let expected = usize::from(count) * 2;
        if usize::from(byte_count) != expected || payload.len() < expected {
            return Err(ExceptionCode::IllegalDataValue);
        }

        let words: Vec<u16, { MAX_WRITE_REGISTERS as usize }> = payload[..expected]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if !regs.write_block(usize::from(start), &words) {
            return Err(ExceptionCode::IllegalDataAddress);
        }
        Ok(Response::WriteMultiple {
            function: FunctionCode::WriteMultipleRegisters,
            start,
            count,
        })
    })
}

// ── Dispatch ──────────────────────────────────────────────────

/// Route a parsed request to its handler.
pub fn dispatch<M, B, S>(io: &SharedIo<M, B, S>, request: &Request) -> HandlerResult
where
    M: RawMutex,
    B: ExpanderBus,
    S: AnalogSampler,
{
    match request {
        Request::ReadCoils { start, count } => read_coils(io, *start, *count),
        Request::ReadDiscreteInputs { start, count } => read_discrete_inputs(io, *start, *count),
        Request::ReadHoldingRegisters { start, count } => {
            read_holding_registers(io, *start, *count)
        }
        Request::ReadInputRegisters { start, count } => read_input_registers(io, *start, *count),
        Request::WriteSingleCoil { address, value } => write_single_coil(io, *address, *value),
        Request::WriteSingleRegister { address, value } => {
            write_single_register(io, *address, *value)
        }
        Request::WriteMultipleCoils {
            start,
            count,
            byte_count,
            payload,
        } => write_multiple_coils(io, *start, *count, *byte_count, payload),
        Request::WriteMultipleRegisters {
            start,
            count,
            byte_count,
            payload,
        } => write_multiple_registers(io, *start, *count, *byte_count, payload),
    }
}
