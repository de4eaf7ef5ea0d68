//! Modbus PDU (Protocol Data Unit) types.
//!
//! Decodes a request PDU (function code + body, framing and CRC already
//! stripped by the front end) into a typed [`Request`], and encodes the
//! bridge's [`Response`] or an exception reply back into PDU bytes.

use core::fmt;

use heapless::Vec;

/// Largest PDU allowed on any Modbus transport.
pub const MAX_PDU_LEN: usize = 253;

/// Largest write payload that fits a PDU (function, start, count, byte count).
pub const MAX_WRITE_PAYLOAD: usize = MAX_PDU_LEN - 6;

/// Quantity limits from the Modbus application protocol.
pub const MAX_READ_BITS: u16 = 2000;
pub const MAX_READ_REGISTERS: u16 = 125;
pub const MAX_WRITE_COILS: u16 = 1968;
pub const MAX_WRITE_REGISTERS: u16 = 123;

/// The two sanctioned single-coil payloads.
pub const COIL_ON: u16 = 0xFF00;
pub const COIL_OFF: u16 = 0x0000;

pub type PduBuf = Vec<u8, MAX_PDU_LEN>;

/// Supported function codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FunctionCode {
    ReadCoils = 0x01,
    ReadDiscreteInputs = 0x02,
    ReadHoldingRegisters = 0x03,
    ReadInputRegisters = 0x04,
    WriteSingleCoil = 0x05,
    WriteSingleRegister = 0x06,
    WriteMultipleCoils = 0x0F,
    WriteMultipleRegisters = 0x10,
}

impl From<FunctionCode> for u8 {
    fn from(code: FunctionCode) -> u8 {
        code as u8
    }
}

impl TryFrom<u8> for FunctionCode {
    type Error = ExceptionCode;

    fn try_from(value: u8) -> Result<Self, ExceptionCode> {
        match value {
            0x01 => Ok(Self::ReadCoils),
            0x02 => Ok(Self::ReadDiscreteInputs),
            0x03 => Ok(Self::ReadHoldingRegisters),
            0x04 => Ok(Self::ReadInputRegisters),
            0x05 => Ok(Self::WriteSingleCoil),
            0x06 => Ok(Self::WriteSingleRegister),
            0x0F => Ok(Self::WriteMultipleCoils),
            0x10 => Ok(Self::WriteMultipleRegisters),
            _ => Err(ExceptionCode::IllegalFunction),
        }
    }
}

impl FunctionCode {
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Self::WriteSingleCoil
                | Self::WriteSingleRegister
                | Self::WriteMultipleCoils
                | Self::WriteMultipleRegisters
        )
    }
}

/// Exception codes the bridge can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExceptionCode {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
    IllegalDataValue = 0x03,
    ServerDeviceFailure = 0x04,
}

impl From<ExceptionCode> for u8 {
    fn from(code: ExceptionCode) -> u8 {
        code as u8
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalFunction => write!(f, "illegal function"),
            Self::IllegalDataAddress => write!(f, "illegal data address"),
            Self::IllegalDataValue => write!(f, "illegal data value"),
            Self::ServerDeviceFailure => write!(f, "server device failure"),
        }
    }
}

/// A parsed request.
///
/// Multi-write payloads are kept as raw bytes together with the declared
/// byte count; consistency between the two is the bridge's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ReadCoils { start: u16, count: u16 },
    ReadDiscreteInputs { start: u16, count: u16 },
    ReadHoldingRegisters { start: u16, count: u16 },
    ReadInputRegisters { start: u16, count: u16 },
    WriteSingleCoil { address: u16, value: u16 },
    WriteSingleRegister { address: u16, value: u16 },
    WriteMultipleCoils {
        start: u16,
        count: u16,
        byte_count: u8,
        payload: Vec<u8, MAX_WRITE_PAYLOAD>,
    },
    WriteMultipleRegisters {
        start: u16,
        count: u16,
        byte_count: u8,
        payload: Vec<u8, MAX_WRITE_PAYLOAD>,
    },
}

fn be16(body: &[u8], at: usize) -> Result<u16, ExceptionCode> {
    match body.get(at..at + 2) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo])),
        _ => Err(ExceptionCode::IllegalDataValue),
    }
}

impl Request {
    /// Decode a request PDU.
    ///
    /// Unknown function code ⇒ illegal function; truncated or oversized
    /// body ⇒ illegal data value.
    pub fn decode(pdu: &[u8]) -> Result<Self, ExceptionCode> {
        let (&fc, body) = pdu.split_first().ok_or(ExceptionCode::IllegalDataValue)?;
        let function = FunctionCode::try_from(fc)?;
        if pdu.len() > MAX_PDU_LEN {
            return Err(ExceptionCode::IllegalDataValue);
        }

        let a = be16(body, 0)?;
        let b = be16(body, 2)?;

        Ok(match function {
            FunctionCode::ReadCoils => Self::ReadCoils { start: a, count: b },
            FunctionCode::ReadDiscreteInputs => Self::ReadDiscreteInputs { start: a, count: b },
            FunctionCode::ReadHoldingRegisters => Self::ReadHoldingRegisters { start: a, count: b },
            FunctionCode::ReadInputRegisters => Self::ReadInputRegisters { start: a, count: b },
            FunctionCode::WriteSingleCoil => Self::WriteSingleCoil {
                address: a,
                value: b,
            },
            FunctionCode::WriteSingleRegister => Self::WriteSingleRegister {
                address: a,
                value: b,
            },
            FunctionCode::WriteMultipleCoils | FunctionCode::WriteMultipleRegisters => {
                let byte_count = *body.get(4).ok_or(ExceptionCode::IllegalDataValue)?;
                let payload = Vec::from_slice(&body[5..])
                    .map_err(|()| ExceptionCode::IllegalDataValue)?;
                if function == FunctionCode::WriteMultipleCoils {
                    Self::WriteMultipleCoils {
                        start: a,
                        count: b,
                        byte_count,
                        payload,
                    }
                } else {
                    Self::WriteMultipleRegisters {
                        start: a,
                        count: b,
                        byte_count,
                        payload,
                    }
                }
            }
        })
    }

    pub fn function(&self) -> FunctionCode {
        match self {
            Self::ReadCoils { .. } => FunctionCode::ReadCoils,
            Self::ReadDiscreteInputs { .. } => FunctionCode::ReadDiscreteInputs,
            Self::ReadHoldingRegisters { .. } => FunctionCode::ReadHoldingRegisters,
            Self::ReadInputRegisters { .. } => FunctionCode::ReadInputRegisters,
            Self::WriteSingleCoil { .. } => FunctionCode::WriteSingleCoil,
            Self::WriteSingleRegister { .. } => FunctionCode::WriteSingleRegister,
            Self::WriteMultipleCoils { .. } => FunctionCode::WriteMultipleCoils,
            Self::WriteMultipleRegisters { .. } => FunctionCode::WriteMultipleRegisters,
        }
    }
}

/// A successful reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Coils or discrete inputs, packed LSB-first.
    Bits {
        function: FunctionCode,
        packed: Vec<u8, { MAX_READ_BITS as usize / 8 }>,
    },
    /// Holding or input registers.
    Registers {
        function: FunctionCode,
        words: Vec<u16, { MAX_READ_REGISTERS as usize }>,
    },
    /// Single writes echo address and value.
    WriteSingle {
        function: FunctionCode,
        address: u16,
        value: u16,
    },
    /// Multiple writes echo start and count.
    WriteMultiple {
        function: FunctionCode,
        start: u16,
        count: u16,
    },
}

impl Response {
    pub fn function(&self) -> FunctionCode {
        match self {
            Self::Bits { function, .. }
            | Self::Registers { function, .. }
            | Self::WriteSingle { function, .. }
            | Self::WriteMultiple { function, .. } => *function,
        }
    }

    /// Encode as PDU bytes. Every variant fits [`MAX_PDU_LEN`] by construction.
    pub fn encode(&self) -> PduBuf {
        let mut out = PduBuf::new();
        let _ = out.push(self.function().into());
        match self {
            Self::Bits { packed, .. } => {
                let _ = out.push(packed.len() as u8);
                let _ = out.extend_from_slice(packed);
            }
            Self::Registers { words, .. } => {
                let _ = out.push((words.len() * 2) as u8);
                for w in words {
                    let _ = out.extend_from_slice(&w.to_be_bytes());
                }
            }
            Self::WriteSingle { address, value, .. } => {
                let _ = out.extend_from_slice(&address.to_be_bytes());
                let _ = out.extend_from_slice(&value.to_be_bytes());
            }
            Self::WriteMultiple { start, count, .. } => {
                let _ = out.extend_from_slice(&start.to_be_bytes());
                let _ = out.extend_from_slice(&count.to_be_bytes());
            }
        }
        out
    }
}

/// Exception reply: `[function | 0x80, code]`.
pub fn exception_pdu(function: u8, code: ExceptionCode) -> PduBuf {
    let mut out = PduBuf::new();
    let _ = out.push(function | 0x80);
    let _ = out.push(code.into());
    out
}
