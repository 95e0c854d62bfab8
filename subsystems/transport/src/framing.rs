//! T=0 character framing.
//!
//! Direct convention: one start bit (low), eight data bits LSB first, one
//! even-parity bit, at least one stop bit with the line released. Receive
//! aligns on the start bit's falling edge and samples mid-bit. Parity and
//! stop violations are logged and the byte is returned anyway; T=0 leaves
//! recovery to the reader's procedure bytes.

use log::warn;
use usim_hal::Contacts;

use crate::{RxError, Transport, MEASURE_GUARD};

/// Depth of the push-back stack used by the PPS peek logic.
const PREFETCH_CAPACITY: usize = 8;

/// LIFO of received bytes the caller rejected and pushed back. Only ever
/// holds bytes the caller has just read, so draining it first cannot
/// reorder the stream as seen above the transport.
pub(crate) struct Prefetch {
    stack: heapless::Vec<u8, PREFETCH_CAPACITY>,
}

impl Prefetch {
    pub(crate) fn new() -> Self {
        Prefetch {
            stack: heapless::Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, byte: u8) {
        // A full stack drops the byte; depth 8 covers the longest PPS.
        let _ = self.stack.push(byte);
    }

    pub(crate) fn pop(&mut self) -> Option<u8> {
        self.stack.pop()
    }

    pub(crate) fn clear(&mut self) {
        self.stack.clear();
    }
}

impl<C: Contacts> Transport<C> {
    /// Transmit one character. Drives the line for the start bit, each
    /// data bit and the parity bit, then releases it for the stop bit and
    /// holds off half an extra ETU of guard time.
    pub fn send_byte(&mut self, byte: u8) {
        self.clock.ensure_ready();

        let mut data = byte;
        let mut parity = 0u8;

        self.contacts.io_drive_low();
        self.contacts.delay_ticks(self.clock.etu());

        for _ in 0..8 {
            if data & 0x01 != 0 {
                self.contacts.io_release();
                parity ^= 1;
            } else {
                self.contacts.io_drive_low();
            }
            self.contacts.delay_ticks(self.clock.etu());
            data >>= 1;
        }

        if parity != 0 {
            self.contacts.io_release();
        } else {
            self.contacts.io_drive_low();
        }
        self.contacts.delay_ticks(self.clock.etu());

        self.contacts.io_release();
        self.contacts.delay_ticks(self.clock.etu());
        self.contacts.delay_ticks(self.clock.half());
    }

    /// Receive one character, scanning for the start edge for at most
    /// `guard` quarter-ETU polls (0 selects the default guard). Any byte
    /// previously pushed back is returned first without touching the line.
    pub fn receive_byte(&mut self, guard: u32) -> Result<u8, RxError> {
        if let Some(byte) = self.prefetch.pop() {
            return Ok(byte);
        }

        self.clock.ensure_ready();

        let mut guard = if guard == 0 { MEASURE_GUARD } else { guard };

        self.contacts.io_release();

        // Start-bit scan; a reset observed here aborts the receive.
        loop {
            if self.contacts.io_level().is_low() {
                break;
            }
            if guard == 0 {
                return Err(RxError::Timeout);
            }
            self.contacts.delay_ticks(self.clock.quarter());
            guard -= 1;

            self.poll_lines();
            if self.atr_ready {
                return Err(RxError::Reset);
            }
        }

        // Re-sample mid start bit to reject glitches.
        self.contacts.delay_ticks(self.clock.half());
        if self.contacts.io_level().is_high() {
            return Err(RxError::Timeout);
        }

        self.contacts.delay_ticks(self.clock.etu());

        let mut value = 0u8;
        let mut parity = 0u8;
        for bit in 0..8 {
            if self.contacts.io_level().is_high() {
                value |= 1 << bit;
                parity ^= 1;
            }
            self.contacts.delay_ticks(self.clock.etu());
        }

        let parity_bit = self.contacts.io_level();
        self.contacts.delay_ticks(self.clock.etu());

        let stop_bit = self.contacts.io_level();
        self.contacts.delay_ticks(self.clock.etu());
        self.contacts.delay_ticks(self.clock.half());

        if (parity ^ u8::from(parity_bit.is_high())) & 0x01 != 0 {
            warn!("SIM RX parity error");
        }
        if stop_bit.is_low() {
            warn!("SIM RX stop bit missing");
        }

        Ok(value)
    }
}
