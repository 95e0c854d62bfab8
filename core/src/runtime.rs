//! The card runtime: power-on sequencing and the command loop.
//!
//! The runtime couples the transport to the card. It owns the T=0
//! receive flow (header under a start timeout, procedure bytes, data
//! phase, optional trailing Le), hands complete commands to
//! [`Card::process`] and streams the response back out. A reset reported
//! by the transport rebuilds the card before the next ATR goes out.

use log::{debug, info, warn};

use usim_apdu::{ins, MAX_COMMAND_LEN, MAX_RESPONSE_LEN};
use usim_hal::Contacts;
use usim_transport::Transport;

use crate::card::Card;

/// Start-byte guard for a fresh command header.
const RX_START_TIMEOUT: u32 = 120_000;

/// Guard between consecutive bytes of one command.
const RX_INTERBYTE_TIMEOUT: u32 = 60_000;

/// T=0 NULL procedure byte.
const PROCEDURE_NULL: u8 = 0x60;

/// Whether an instruction's P3 is an Lc (data follows from the reader)
/// rather than an Le.
fn instruction_requires_lc(instruction: u8) -> bool {
    match instruction {
        ins::SELECT_FILE
        | ins::UPDATE_BINARY
        | ins::VERIFY_CHV
        | ins::CHANGE_CHV
        | ins::AUTHENTICATE => true,
        #[cfg(feature = "usat")]
        ins::USAT_DATA_DOWNLOAD | ins::USAT_ENVELOPE => true,
        #[cfg(feature = "config-apdu")]
        ins::WRITE_CONFIG | ins::XOR_AUTH => true,
        _ => false,
    }
}

/// Transport plus card, driven by a cooperative main loop.
pub struct CardRuntime<C: Contacts> {
    transport: Transport<C>,
    card: Card,
}

impl<C: Contacts> CardRuntime<C> {
    /// Wrap the contacts and build a fresh card.
    pub fn new(contacts: C) -> Self {
        CardRuntime {
            transport: Transport::new(contacts),
            card: Card::new(),
        }
    }

    /// Block until the reader performs a cold reset, then answer with the
    /// ATR and run the PPS window.
    pub fn power_on(&mut self) {
        info!("USIM COS ready, waiting for ISO 7816 reset");
        self.transport.wait_for_atr_window();
        self.transport.send_atr();
        self.transport.negotiate_pps();
    }

    /// One main-loop iteration: honour a pending reset or serve at most
    /// one command.
    pub fn service(&mut self) {
        if self.transport.detect_reset_request() {
            debug!("ISO reset, reinitializing session");
            self.card = Card::new();
            self.transport.send_atr();
            self.transport.negotiate_pps();
            return;
        }

        let mut command = [0u8; MAX_COMMAND_LEN];
        let Some(len) = self.receive_apdu(&mut command) else {
            return;
        };

        let mut wire = [0u8; MAX_RESPONSE_LEN];
        let response = self.card.process(&command[..len], &mut wire);
        for &byte in response {
            self.transport.send_byte(byte);
        }
    }

    /// Run forever. The embedding's whole main loop.
    pub fn run(&mut self) -> ! {
        self.power_on();
        loop {
            self.service();
        }
    }

    /// Assemble one command from the wire.
    ///
    /// Reads the 4-byte header, probes for P3, and when the instruction
    /// carries Lc echoes INS as the procedure byte so the reader streams
    /// the data field, then probes for an optional trailing Le. The NULL
    /// procedure byte is sent once the command is complete so the reader
    /// keeps waiting for the real status.
    fn receive_apdu(&mut self, buffer: &mut [u8; MAX_COMMAND_LEN]) -> Option<usize> {
        buffer[0] = self.transport.receive_byte(RX_START_TIMEOUT).ok()?;
        for slot in buffer.iter_mut().take(4).skip(1) {
            *slot = self.transport.receive_byte(RX_INTERBYTE_TIMEOUT).ok()?;
        }
        let instruction = buffer[1];
        let mut len = 4;

        // No P3 within the guard: a header-only (case 1) command.
        let Ok(p3) = self.transport.receive_byte(RX_INTERBYTE_TIMEOUT) else {
            self.transport.send_byte(PROCEDURE_NULL);
            return Some(len);
        };
        buffer[len] = p3;
        len += 1;

        if instruction_requires_lc(instruction) {
            let lc = usize::from(p3);
            if lc > 0 {
                // ACK with INS: the reader may now send the data field.
                self.transport.send_byte(instruction);
                for _ in 0..lc {
                    match self.transport.receive_byte(RX_INTERBYTE_TIMEOUT) {
                        Ok(byte) => {
                            buffer[len] = byte;
                            len += 1;
                        }
                        Err(_) => {
                            warn!("APDU RX timeout in data phase");
                            return None;
                        }
                    }
                }
            }

            // A byte trailing the data field is the case-4 Le.
            if let Ok(le) = self.transport.receive_byte(RX_INTERBYTE_TIMEOUT) {
                buffer[len] = le;
                len += 1;
            }
        }

        self.transport.send_byte(PROCEDURE_NULL);
        Some(len)
    }
}
