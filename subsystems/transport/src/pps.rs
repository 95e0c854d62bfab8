//! Protocol and Parameters Selection.
//!
//! Attempted exactly once per reset, right after the ATR. Anything that is
//! not a well-formed PPS request is pushed back onto the prefetch stack so
//! the dispatcher re-reads it as the first APDU header bytes. A valid
//! request is echoed verbatim when it proposes T=0 with default parameters
//! and accepted silently (no echo, no change) otherwise.

use log::debug;
use usim_hal::Contacts;

use crate::{Transport, PPS_INTERBYTE_TIMEOUT, PPS_START_TIMEOUT};

/// PPSS, PPS0, up to three parameter bytes, PCK.
const MAX_PPS_LEN: usize = 6;

impl<C: Contacts> Transport<C> {
    /// Run the post-ATR PPS window. Every exit path latches `pps_done`
    /// so the exchange cannot rerun until the next reset.
    pub fn negotiate_pps(&mut self) {
        if self.pps_done {
            return;
        }

        let Ok(first) = self.receive_byte(PPS_START_TIMEOUT) else {
            // Silence inside the window: the reader skipped PPS entirely.
            self.pps_done = true;
            return;
        };

        let mut consumed: heapless::Vec<u8, MAX_PPS_LEN> = heapless::Vec::new();
        let _ = consumed.push(first);

        if first != 0xFF {
            // Already the first APDU header byte.
            self.prefetch.push(first);
            self.pps_done = true;
            return;
        }

        let Ok(pps0) = self.receive_byte(PPS_INTERBYTE_TIMEOUT) else {
            self.prefetch.push(first);
            self.pps_done = true;
            return;
        };
        let _ = consumed.push(pps0);

        if !(0x10..=0x1F).contains(&pps0) {
            self.push_back_all(&consumed);
            self.pps_done = true;
            return;
        }

        let optional_mask = pps0 & 0x0F;
        let mut xor_acc = first ^ pps0;
        let mut optional_count = 0u8;

        for bit in 0..3 {
            if optional_mask & (1 << bit) == 0 {
                continue;
            }
            let Ok(param) = self.receive_byte(PPS_INTERBYTE_TIMEOUT) else {
                self.pps_done = true;
                return;
            };
            let _ = consumed.push(param);
            xor_acc ^= param;
            optional_count += 1;
        }

        let Ok(pck) = self.receive_byte(PPS_INTERBYTE_TIMEOUT) else {
            self.pps_done = true;
            return;
        };
        let _ = consumed.push(pck);
        xor_acc ^= pck;

        if xor_acc != 0 {
            debug!("PPS checksum mismatch, treating as APDU");
            self.push_back_all(&consumed);
            self.pps_done = true;
            return;
        }

        self.pps_done = true;

        if optional_mask & 0x08 != 0 {
            debug!("PPS reserved bit set, accepted without echo");
            return;
        }

        if optional_count > 0 {
            debug!("PPS parameter change ignored");
            return;
        }

        self.send_byte(first);
        self.send_byte(pps0);
        self.send_byte(pck);
        debug!("PPS echoed");
    }

    /// Push the consumed bytes back in reverse so the LIFO replays them
    /// in original wire order.
    fn push_back_all(&mut self, consumed: &[u8]) {
        for &byte in consumed.iter().rev() {
            self.prefetch.push(byte);
        }
    }
}
