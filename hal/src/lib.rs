//! # USIM Hardware Abstraction Layer
//!
//! The electrical seam between the card firmware and whatever drives the
//! ISO 7816 contacts. The transport layer is written purely against the
//! [`Contacts`] trait; a chip port implements it over GPIO and a hardware
//! timer, while the `sim` feature provides a deterministic host bench that
//! plays the reader side of the interface for tests and demos.
//!
//! ## Contact assignment
//!
//! Following ISO/IEC 7816-2: C1 = VCC, C2 = RST, C3 = CLK, C7 = I/O. The
//! card never drives VCC, RST or CLK; it only samples them. The I/O contact
//! is open-drain in spirit: the card either pulls it low or releases it and
//! lets the reader-side pull-up win.

#![no_std]
#![warn(missing_docs)]

#[cfg(feature = "sim")]
extern crate std;

#[cfg(feature = "sim")]
pub mod sim;

/// Logic level of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Driven or pulled to ground.
    Low,
    /// At supply voltage.
    High,
}

impl Level {
    /// Returns `true` for [`Level::High`].
    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Returns `true` for [`Level::Low`].
    #[inline]
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

impl From<bool> for Level {
    #[inline]
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Access to the card contacts and the tick timer.
///
/// All timing in the transport is expressed in ticks of one monotonic
/// hardware timer; the ETU discipline is layered on top by the caller.
/// Sampling methods take `&mut self` because an implementation may account
/// time against each sample (the host bench charges one tick per read, which
/// is also roughly what a polling loop costs on the real chip).
pub trait Contacts {
    /// Pull the I/O contact to ground.
    fn io_drive_low(&mut self);

    /// Release the I/O contact (high-Z; the reader's pull-up takes over).
    fn io_release(&mut self);

    /// Sample the I/O contact.
    fn io_level(&mut self) -> Level;

    /// Sample the reader clock contact.
    fn clk_level(&mut self) -> Level;

    /// Sample the reset contact.
    fn rst_level(&mut self) -> Level;

    /// Sample the supply-presence contact.
    fn vcc_level(&mut self) -> Level;

    /// Busy-wait for the given number of timer ticks.
    fn delay_ticks(&mut self, ticks: u32);
}
