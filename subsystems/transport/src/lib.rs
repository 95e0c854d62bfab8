//! # ISO 7816-3 T=0 Transport
//!
//! Converts line activity on the SIM contacts to and from whole octets.
//! The transport owns four concerns:
//!
//! - **ETU calibration**: on every reset the elementary time unit is
//!   re-derived from the observed reader clock ([`timing`]).
//! - **Reset gate**: VCC detection, RST edge tracking and the ATR window
//!   ([`gate`]).
//! - **Byte framing**: direct-convention characters with even parity and
//!   mid-bit sampling, plus the push-back prefetch stack ([`framing`]).
//! - **PPS**: the one-shot post-ATR parameter exchange ([`pps`]).
//!
//! Everything blocks. The transport is the only place in the stack that
//! suspends, and it does so by busy-waiting on the [`Contacts`] timer, so
//! the card stays a single cooperative actor.

#![no_std]

mod atr;
mod framing;
mod gate;
mod pps;
mod timing;

pub use atr::ATR;
pub use timing::EtuClock;

use core::fmt;

use usim_hal::{Contacts, Level};

use framing::Prefetch;

/// Guard count used when a receive is issued with no explicit timeout.
pub(crate) const MEASURE_GUARD: u32 = 200_000;

/// Polls without VCC before assuming the pin floats high.
pub(crate) const VCC_FALLBACK_POLLS: u32 = 80_000;

/// Guard time between the ATR window opening and the first ATR character.
pub(crate) const ATR_GUARD_ETUS: u16 = 420;

/// Idle delay between gate polls while parked before the ATR window.
pub(crate) const IDLE_POLL_TICKS: u32 = 1_000;

/// Start-byte guard for the PPS request window.
pub(crate) const PPS_START_TIMEOUT: u32 = 120_000;

/// Inter-byte guard within a PPS request.
pub(crate) const PPS_INTERBYTE_TIMEOUT: u32 = 60_000;

/// Why a receive produced no byte.
///
/// Parity and stop-bit violations are *not* errors at this level: the byte
/// is still returned and recovery is the reader's business under T=0 rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxError {
    /// No start edge (or a glitched one) before the guard ran out.
    Timeout,
    /// An ISO reset was observed while waiting; the session must restart.
    Reset,
}

impl fmt::Display for RxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RxError::Timeout => write!(f, "no start bit within guard"),
            RxError::Reset => write!(f, "reset observed during receive"),
        }
    }
}

/// The T=0 character transport over a set of card contacts.
pub struct Transport<C: Contacts> {
    pub(crate) contacts: C,
    pub(crate) clock: EtuClock,
    pub(crate) vcc_present: bool,
    pub(crate) reset_pending: bool,
    pub(crate) atr_ready: bool,
    pub(crate) rst_last: Level,
    pub(crate) poll_count: u32,
    pub(crate) prefetch: Prefetch,
    pub(crate) pps_done: bool,
}

impl<C: Contacts> Transport<C> {
    /// Take ownership of the contacts and park the line released.
    ///
    /// The reset line is assumed low until the gate observes otherwise, so
    /// a reader that powered up first still produces a clean rising edge.
    pub fn new(mut contacts: C) -> Self {
        let vcc_present = contacts.vcc_level().is_high();
        contacts.io_release();
        Transport {
            contacts,
            clock: EtuClock::new(),
            vcc_present,
            reset_pending: true,
            atr_ready: false,
            rst_last: Level::Low,
            poll_count: 0,
            prefetch: Prefetch::new(),
            pps_done: false,
        }
    }

    /// Current elementary time unit in timer ticks.
    pub fn etu_ticks(&self) -> u32 {
        self.clock.etu()
    }

    /// Busy-wait for a whole number of ETUs.
    pub(crate) fn delay_etus(&mut self, mut etus: u16) {
        while etus > 0 {
            self.contacts.delay_ticks(self.clock.etu());
            etus -= 1;
        }
    }
}
