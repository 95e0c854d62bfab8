//! VCC/reset gate and clock calibration.
//!
//! The gate tracks three conditions: supply present, reset pending, and
//! ATR window open. A falling RST marks the reset pending; its rising edge
//! re-arms the whole transport (fresh ETU measurement, cleared prefetch,
//! cleared PPS latch) and opens the ATR window.

use log::debug;
use usim_hal::Contacts;

use crate::timing::ETU_FACTOR;
use crate::{Transport, ATR_GUARD_ETUS, IDLE_POLL_TICKS, MEASURE_GUARD, VCC_FALLBACK_POLLS};

impl<C: Contacts> Transport<C> {
    /// One gate poll. Called from the main loop probe, from the ATR wait
    /// and from inside the start-bit scan so a reset can interrupt a
    /// pending receive.
    pub(crate) fn poll_lines(&mut self) {
        self.poll_count = self.poll_count.saturating_add(1);

        if !self.vcc_present {
            if self.contacts.vcc_level().is_high() {
                self.vcc_present = true;
                debug!("SIM VCC detected");
            } else if self.poll_count > VCC_FALLBACK_POLLS {
                // Bench supplies often leave the VCC sense pin floating.
                self.vcc_present = true;
                debug!("assuming SIM VCC present");
            } else {
                return;
            }
        }

        let rst = self.contacts.rst_level();
        if rst.is_low() {
            self.reset_pending = true;
        } else if self.reset_pending && self.rst_last.is_low() {
            self.prepare_after_reset();
            self.atr_ready = true;
            self.reset_pending = false;
            self.poll_count = 0;
            debug!("ISO 7816 reset detected");
        }
        self.rst_last = rst;
    }

    /// Block until a reset opens the ATR window, then honour the guard
    /// time before the first ATR character may go out.
    pub fn wait_for_atr_window(&mut self) {
        while !self.atr_ready {
            self.poll_lines();
            self.contacts.delay_ticks(IDLE_POLL_TICKS);
        }
        self.atr_ready = false;
        self.clock.ensure_ready();
        self.delay_etus(ATR_GUARD_ETUS);
    }

    /// Non-blocking reset probe for the main loop. Returns `true` when a
    /// reset was consumed; the caller must rebuild its session and send a
    /// fresh ATR.
    pub fn detect_reset_request(&mut self) -> bool {
        self.poll_lines();
        if !self.atr_ready {
            return false;
        }
        self.atr_ready = false;
        self.clock.ensure_ready();
        self.delay_etus(ATR_GUARD_ETUS);
        self.prefetch.clear();
        self.pps_done = false;
        true
    }

    /// Everything that must happen between the RST rising edge and the
    /// ATR: resynchronise the ETU, release the line, drop any pushed-back
    /// bytes and re-arm the PPS exchange.
    fn prepare_after_reset(&mut self) {
        self.recalibrate();
        self.contacts.io_release();
        self.prefetch.clear();
        self.pps_done = false;
    }

    /// Measure the reader clock and derive the ETU from it; on failure
    /// keep (or fall back to) the previous calibration.
    fn recalibrate(&mut self) {
        match self.measure_clock_period() {
            Some(period) => {
                self.clock.set_ticks(period.saturating_mul(ETU_FACTOR));
                self.clock.mark_ready();
                debug!("SIM clock synchronised, etu={} ticks", self.clock.etu());
            }
            None => {
                self.clock.ensure_ready();
                debug!("SIM clock measurement fallback");
            }
        }
    }

    /// Sample-count one full high-low cycle of CLK. Each sample accounts
    /// one timer tick, so the count doubles as the period in ticks.
    fn measure_clock_period(&mut self) -> Option<u32> {
        let mut guard = MEASURE_GUARD;
        while self.contacts.clk_level().is_high() {
            guard -= 1;
            if guard == 0 {
                return None;
            }
        }

        let mut guard = MEASURE_GUARD;
        while self.contacts.clk_level().is_low() {
            guard -= 1;
            if guard == 0 {
                return None;
            }
        }

        // Rising edge seen; count across one high phase and one low phase.
        let mut period: u32 = 0;
        let mut guard = MEASURE_GUARD;
        while self.contacts.clk_level().is_high() {
            period += 1;
            guard -= 1;
            if guard == 0 {
                return None;
            }
        }

        let mut guard = MEASURE_GUARD;
        while self.contacts.clk_level().is_low() {
            period += 1;
            guard -= 1;
            if guard == 0 {
                return None;
            }
        }

        Some(period)
    }
}
