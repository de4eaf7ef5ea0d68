//! Line-oriented serial console.
//!
//! [`LineReader`] assembles bytes into lines; [`parse_command`] turns a line
//! into an [`AppCommand`].
//!
//! ```text
//! send 0xABCDEF protocol=2 repeat=5
//! set size=24, pulse=320; raw=1
//! show | save | defaults | help
//! ```
//!
//! Parameters are separated by any of ` ,;` and written `key=value`.
//! Numbers accept decimal, `0x` hex and `0b` binary.

use core::fmt;

use heapless::String;

use crate::app::commands::{AppCommand, ParamUpdate};

/// Longest accepted console line; further characters are dropped.
pub const MAX_LINE: usize = 96;

const DELIMITERS: &[char] = &[' ', ',', ';'];

pub const HELP: &str = "\
commands:
  send <code> [size=N] [pulse=US] [protocol=N] [repeat=N]
  set [size=N] [pulse=US] [protocol=N] [repeat=N] [raw=0|1]
  show      print the live configuration
  save      persist the configuration
  defaults  restore default radio parameters
  help      this text";

// ── Line reader ───────────────────────────────────────────────

/// Case folding applied to every stored character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharCase {
    Keep,
    Lower,
    Upper,
}

pub type Line = String<MAX_LINE>;

pub struct LineReader {
    buf: Line,
    case: CharCase,
    echo: bool,
}

impl LineReader {
    pub fn new(case: CharCase, echo: bool) -> Self {
        Self {
            buf: Line::new(),
            case,
            echo,
        }
    }

    /// Feed one received byte. Returns the completed line on `\n`.
    ///
    /// `\b` erases the last character, `\r` is ignored, and non-ASCII bytes
    /// are dropped. With echo enabled every byte is written back to `out`.
    pub fn feed(&mut self, byte: u8, out: &mut impl fmt::Write) -> Option<Line> {
        if self.echo && byte.is_ascii() {
            let _ = out.write_char(char::from(byte));
        }
        match byte {
            b'\n' => Some(core::mem::take(&mut self.buf)),
            0x08 => {
                self.buf.pop();
                None
            }
            b'\r' => None,
            b if b.is_ascii() => {
                let c = match self.case {
                    CharCase::Keep => b,
                    CharCase::Lower => b.to_ascii_lowercase(),
                    CharCase::Upper => b.to_ascii_uppercase(),
                };
                let _ = self.buf.push(char::from(c));
                None
            }
            _ => None,
        }
    }

    /// Characters of the line being typed.
    pub fn pending(&self) -> &str {
        &self.buf
    }
}

// ── Parser ────────────────────────────────────────────────────

/// Why a console line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// The line held no command.
    Empty,
    UnknownCommand,
    /// A required positional argument is missing (names which).
    MissingArgument(&'static str),
    /// A `key=value` pair has no value.
    MissingValue,
    UnknownKey,
    /// Not a number, or out of range for its field.
    InvalidNumber,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::UnknownCommand => write!(f, "unknown command (try 'help')"),
            Self::MissingArgument(what) => write!(f, "missing argument: {what}"),
            Self::MissingValue => write!(f, "parameter without value"),
            Self::UnknownKey => write!(f, "unknown parameter"),
            Self::InvalidNumber => write!(f, "invalid number"),
        }
    }
}

/// Parse `0x…`, `0b…` or decimal into a `u32`.
pub fn parse_number(text: &str) -> Result<u32, ConsoleError> {
    let (digits, radix) = if let Some(h) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (h, 16)
    } else if let Some(b) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (b, 2)
    } else {
        (text, 10)
    };
    u32::from_str_radix(digits, radix).map_err(|_| ConsoleError::InvalidNumber)
}

fn parse_bool(text: &str) -> Result<bool, ConsoleError> {
    match text {
        "1" | "on" | "true" | "yes" => Ok(true),
        "0" | "off" | "false" | "no" => Ok(false),
        _ => Err(ConsoleError::InvalidNumber),
    }
}

fn narrow<T: TryFrom<u32>>(text: &str) -> Result<T, ConsoleError> {
    T::try_from(parse_number(text)?).map_err(|_| ConsoleError::InvalidNumber)
}

/// Apply every `key=value` token to a [`ParamUpdate`].
fn parse_params<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<ParamUpdate, ConsoleError> {
    let mut update = ParamUpdate::default();
    for token in tokens {
        let (key, value) = token.split_once('=').ok_or(ConsoleError::MissingValue)?;
        if value.is_empty() {
            return Err(ConsoleError::MissingValue);
        }
        let key = key.to_ascii_lowercase();
        let value = value.to_ascii_lowercase();
        match key.as_str() {
            "size" => update.bit_size = Some(narrow(&value)?),
            "pulse" => update.pulse_length_us = Some(narrow(&value)?),
            "protocol" => update.protocol = Some(narrow(&value)?),
            "repeat" => update.repeat = Some(narrow(&value)?),
            "raw" => update.print_raw = Some(parse_bool(&value)?),
            _ => return Err(ConsoleError::UnknownKey),
        }
    }
    Ok(update)
}

/// Parse one console line.
pub fn parse_command(line: &str) -> Result<AppCommand, ConsoleError> {
    let mut tokens = line.split(DELIMITERS).filter(|t| !t.is_empty());
    let word = tokens.next().ok_or(ConsoleError::Empty)?;

    let is = |name: &str| word.eq_ignore_ascii_case(name);
    if is("send") {
        let code = tokens.next().ok_or(ConsoleError::MissingArgument("code"))?;
        let code = parse_number(&code.to_ascii_lowercase())?;
        let overrides = parse_params(tokens)?;
        if overrides.print_raw.is_some() {
            return Err(ConsoleError::UnknownKey);
        }
        Ok(AppCommand::Transmit { code, overrides })
    } else if is("set") {
        Ok(AppCommand::SetParams(parse_params(tokens)?))
    } else if is("show") {
        Ok(AppCommand::ShowConfig)
    } else if is("save") {
        Ok(AppCommand::SaveConfig)
    } else if is("defaults") {
        Ok(AppCommand::RestoreDefaults)
    } else if is("help") || is("?") {
        Ok(AppCommand::Help)
    } else {
        Err(ConsoleError::UnknownCommand)
    }
}
