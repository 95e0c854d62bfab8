//! # APDU Codec
//!
//! Short-form command parsing (cases 1 through 4), response accumulation
//! and the ISO 7816-4 status words used by the card. The codec is pure:
//! it never touches the line, the session or the file system.

#![no_std]

mod command;
mod response;
mod status;

pub use command::{ApduCase, Command};
pub use response::Response;
pub use status::StatusWord;

/// Ceiling for Lc and for response data in short form.
pub const MAX_DATA_LEN: usize = 255;

/// Largest wire command: header, P3, data, trailing Le.
pub const MAX_COMMAND_LEN: usize = 5 + MAX_DATA_LEN + 1;

/// Largest wire response: data plus SW1 SW2.
pub const MAX_RESPONSE_LEN: usize = MAX_DATA_LEN + 2;

/// Command class bytes accepted by the card.
pub mod cla {
    /// ISO interindustry class.
    pub const STANDARD: u8 = 0x00;
    /// GSM 11.11 class, accepted interchangeably with [`STANDARD`].
    pub const GSM: u8 = 0xA0;
    /// Proprietary class carrying the USAT and configuration surfaces.
    pub const PROPRIETARY: u8 = 0x80;
}

/// Instruction bytes.
pub mod ins {
    pub const SELECT_FILE: u8 = 0xA4;
    pub const READ_BINARY: u8 = 0xB0;
    pub const UPDATE_BINARY: u8 = 0xD6;
    pub const AUTHENTICATE: u8 = 0x88;
    pub const VERIFY_CHV: u8 = 0x20;
    pub const CHANGE_CHV: u8 = 0x24;
    pub const DISABLE_CHV: u8 = 0x26;
    pub const ENABLE_CHV: u8 = 0x28;
    pub const UNBLOCK_CHV: u8 = 0x2C;
    pub const GET_RESPONSE: u8 = 0xC0;
    pub const STATUS: u8 = 0xF2;

    pub const USAT_DATA_DOWNLOAD: u8 = 0x81;
    pub const USAT_ENVELOPE: u8 = 0xC3;
    pub const USAT_FETCH: u8 = 0x12;

    pub const WRITE_CONFIG: u8 = 0xD0;
    pub const READ_CONFIG: u8 = 0xD1;
    pub const XOR_AUTH: u8 = 0xA0;
    pub const RESET_SIM: u8 = 0xE0;
}
