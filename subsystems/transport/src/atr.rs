//! Answer To Reset.

use log::debug;
use static_assertions::const_assert;
use usim_hal::Contacts;

use crate::Transport;

/// The fixed ATR announced after every reset: T=0, direct convention,
/// TS 102 221 compatible historical bytes.
pub const ATR: [u8; 15] = [
    0x3B, 0x9F, 0x96, 0x80, 0x1F, 0xC7, 0x80, 0x31, 0xE0, 0x73, 0xFE, 0x21, 0x13, 0x57, 0x4A,
];

// ISO 7816-3 caps the ATR at 33 characters.
const_assert!(ATR.len() <= 33);

impl<C: Contacts> Transport<C> {
    /// Transmit the ATR. Must only be called inside a fresh ATR window
    /// (after [`Transport::wait_for_atr_window`] or a consumed reset).
    pub fn send_atr(&mut self) {
        for byte in ATR {
            self.send_byte(byte);
        }
        debug!("ATR transmitted");
    }
}
