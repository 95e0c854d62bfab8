//! Host-side reader/card bench.
//!
//! A deterministic software double for the electrical interface: virtual
//! time instead of a hardware timer, generated CLK, scheduled RST/VCC/I-O
//! waveforms for the reader side, and a transition log for the card side
//! that is decoded back into bytes. Nothing here runs on the chip; the
//! bench exists so the whole transport stack can be exercised bit by bit
//! on a workstation.
//!
//! Time accounting: `delay_ticks(n)` advances the clock by exactly `n`;
//! every contact sample costs one tick, which stands in for the loop
//! overhead of a polling read on the real part.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use log::trace;

use crate::{Contacts, Level};

/// Ticks charged per contact sample.
const SAMPLE_COST: u64 = 1;

/// One ETU holds 372 clock cycles at the default Fi/Di.
const ETU_FACTOR: u64 = 372;

/// The card clamps its derived ETU to this range; the bench mirrors the
/// clamp so both sides agree on bit timing.
const MIN_ETU_TICKS: u64 = 8;
const MAX_ETU_TICKS: u64 = 65_535;

/// Gap between a satisfied script step and the first reader bit.
const SEND_LEAD_ETUS: u64 = 4;

/// Reader inter-byte period (start edge to start edge).
const BYTE_PERIOD_ETUS: u64 = 16;

/// Bench construction parameters.
#[derive(Debug, Clone, Copy)]
pub struct BenchConfig {
    /// Half-period of the generated reader clock, in ticks.
    pub clk_half_period: u64,
    /// How long RST is held low after power-on before the first rising edge.
    pub rst_low_ticks: u64,
    /// Whether the VCC contact reads high (benches that float the pin set
    /// this to `false` and rely on the transport's optimistic fallback).
    pub vcc_present: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            clk_half_period: 64,
            rst_low_ticks: 5_000,
            vcc_present: true,
        }
    }
}

/// One queued reader action.
enum Action {
    /// Wait until the card has produced this many bytes in total.
    Expect(u64),
    /// Transmit bytes on the I/O line.
    Send(Vec<u8>),
    /// Pulse RST low for the given number of ticks.
    Reset { low_ticks: u64 },
}

/// A level change on a line at an absolute tick.
type Edge = (u64, Level);

struct BenchState {
    now: u64,
    etu: u64,
    clk_half_period: u64,
    vcc_present: bool,
    rst_schedule: Vec<Edge>,
    reader_io: Vec<Edge>,
    /// End of the last scheduled reader frame; later sends queue after it.
    reader_tail: u64,
    card_drives_low: bool,
    tx_log: Vec<Edge>,
    decoded: Vec<u8>,
    decode_from: u64,
    parity_errors: usize,
    framing_errors: usize,
    script: VecDeque<Action>,
    expect_total: u64,
}

impl BenchState {
    fn new(cfg: BenchConfig) -> Self {
        Self {
            now: 0,
            etu: (2 * cfg.clk_half_period * ETU_FACTOR).clamp(MIN_ETU_TICKS, MAX_ETU_TICKS),
            clk_half_period: cfg.clk_half_period,
            vcc_present: cfg.vcc_present,
            rst_schedule: std::vec![(0, Level::Low), (cfg.rst_low_ticks, Level::High)],
            reader_io: Vec::new(),
            reader_tail: 0,
            card_drives_low: false,
            tx_log: Vec::new(),
            decoded: Vec::new(),
            decode_from: 0,
            parity_errors: 0,
            framing_errors: 0,
            script: VecDeque::new(),
            expect_total: 0,
        }
    }

    fn advance(&mut self, ticks: u64) {
        self.now += ticks;
        self.run_script();
    }

    fn set_card_drive(&mut self, low: bool) {
        if self.card_drives_low != low {
            self.card_drives_low = low;
            let level = if low { Level::Low } else { Level::High };
            self.tx_log.push((self.now, level));
        }
        self.run_script();
    }

    fn level_at(edges: &[Edge], t: u64) -> Level {
        edges
            .iter()
            .rev()
            .find(|(tick, _)| *tick <= t)
            .map(|(_, level)| *level)
            .unwrap_or(Level::High)
    }

    fn sample_io(&mut self) -> Level {
        self.advance(SAMPLE_COST);
        if self.card_drives_low {
            Level::Low
        } else {
            Self::level_at(&self.reader_io, self.now)
        }
    }

    fn sample_clk(&mut self) -> Level {
        self.advance(SAMPLE_COST);
        if (self.now / self.clk_half_period) % 2 == 0 {
            Level::High
        } else {
            Level::Low
        }
    }

    fn sample_rst(&mut self) -> Level {
        self.advance(SAMPLE_COST);
        Self::level_at(&self.rst_schedule, self.now)
    }

    fn sample_vcc(&mut self) -> Level {
        self.advance(SAMPLE_COST);
        if self.vcc_present {
            Level::High
        } else {
            Level::Low
        }
    }

    /// Decode any card frames that have fully played out by `now`.
    fn decode_pending(&mut self) {
        loop {
            // Everything before `decode_from` is already decoded; skip it
            // instead of rescanning the whole log on every advance.
            let skip = self.tx_log.partition_point(|(t, _)| *t < self.decode_from);
            let start = self.tx_log[skip..]
                .iter()
                .find(|(_, l)| l.is_low())
                .map(|(t, _)| *t);
            let Some(t0) = start else { return };
            if self.now < t0 + 11 * self.etu {
                return;
            }

            let mut value = 0u8;
            let mut ones = 0u32;
            for bit in 0..8u64 {
                let sample = t0 + self.etu + self.etu / 2 + bit * self.etu;
                if Self::level_at(&self.tx_log, sample).is_high() {
                    value |= 1 << bit;
                    ones += 1;
                }
            }
            let parity = Self::level_at(&self.tx_log, t0 + 9 * self.etu + self.etu / 2);
            let stop = Self::level_at(&self.tx_log, t0 + 10 * self.etu + self.etu / 2);

            if parity.is_high() != (ones % 2 == 1) {
                self.parity_errors += 1;
            }
            if stop.is_low() {
                self.framing_errors += 1;
            }

            trace!("bench: card byte {value:#04x} at tick {t0}");
            self.decoded.push(value);
            self.decode_from = t0 + 11 * self.etu;
        }
    }

    /// Retire every script step that is currently satisfiable.
    fn run_script(&mut self) {
        self.decode_pending();
        loop {
            let blocked = matches!(
                self.script.front(),
                Some(Action::Expect(target)) if (self.decoded.len() as u64) < *target
            );
            if blocked {
                return;
            }
            let Some(action) = self.script.pop_front() else {
                return;
            };
            match action {
                Action::Expect(_) => {}
                Action::Send(bytes) => self.schedule_send(&bytes),
                Action::Reset { low_ticks } => {
                    let at = self.now + SEND_LEAD_ETUS * self.etu;
                    trace!("bench: RST pulse at tick {at} for {low_ticks}");
                    self.rst_schedule.push((at, Level::Low));
                    self.rst_schedule.push((at + low_ticks, Level::High));
                }
            }
        }
    }

    fn schedule_send(&mut self, bytes: &[u8]) {
        let lead = self.now + SEND_LEAD_ETUS * self.etu;
        let mut start = lead.max(self.reader_tail);
        for &byte in bytes {
            self.schedule_byte(start, byte);
            start += BYTE_PERIOD_ETUS * self.etu;
        }
        self.reader_tail = start;
    }

    /// Lay out one T=0 character: start, 8 data bits LSB first, even
    /// parity, stop (idle high resumes at the stop bit).
    fn schedule_byte(&mut self, t0: u64, byte: u8) {
        trace!("bench: reader byte {byte:#04x} at tick {t0}");
        let mut push = |t: u64, level: Level| {
            debug_assert!(self.reader_io.last().map_or(true, |(last, _)| *last <= t));
            self.reader_io.push((t, level));
        };

        push(t0, Level::Low);
        let mut ones = 0u32;
        for bit in 0..8u64 {
            let high = byte & (1 << bit) != 0;
            if high {
                ones += 1;
            }
            push(t0 + (1 + bit) * self.etu, Level::from(high));
        }
        push(t0 + 9 * self.etu, Level::from(ones % 2 == 1));
        push(t0 + 10 * self.etu, Level::High);
    }
}

/// Shared handle to the bench.
///
/// The handle is cloned between the transport (which owns one as its
/// [`Contacts`] implementation) and the test, which keeps another to queue
/// reader actions and inspect decoded card output.
#[derive(Clone)]
pub struct Bench(Rc<RefCell<BenchState>>);

impl Bench {
    /// Create a bench with the given electrical parameters.
    pub fn new(cfg: BenchConfig) -> Self {
        Bench(Rc::new(RefCell::new(BenchState::new(cfg))))
    }

    /// Create a bench with default parameters.
    pub fn with_defaults() -> Self {
        Self::new(BenchConfig::default())
    }

    /// The bit period both sides agree on, in ticks.
    pub fn etu(&self) -> u64 {
        self.0.borrow().etu
    }

    /// Current virtual time.
    pub fn now(&self) -> u64 {
        self.0.borrow().now
    }

    /// Queue: block the script until the card has emitted `n` further bytes.
    pub fn expect_card_bytes(&self, n: usize) {
        let mut state = self.0.borrow_mut();
        state.expect_total += n as u64;
        let target = state.expect_total;
        state.script.push_back(Action::Expect(target));
    }

    /// Queue: transmit `bytes` from the reader side.
    pub fn send(&self, bytes: &[u8]) {
        self.0
            .borrow_mut()
            .script
            .push_back(Action::Send(bytes.to_vec()));
    }

    /// Queue: pulse RST low (a warm reset) for `low_ticks`.
    pub fn pulse_reset(&self, low_ticks: u64) {
        self.0
            .borrow_mut()
            .script
            .push_back(Action::Reset { low_ticks });
    }

    /// Whether every queued action has been retired.
    pub fn script_done(&self) -> bool {
        self.0.borrow().script.is_empty()
    }

    /// All card bytes decoded so far, in wire order.
    pub fn card_bytes(&self) -> Vec<u8> {
        let mut state = self.0.borrow_mut();
        state.decode_pending();
        state.decoded.clone()
    }

    /// Count of card frames whose parity bit disagreed with the data.
    pub fn parity_errors(&self) -> usize {
        self.0.borrow().parity_errors
    }

    /// Count of card frames with a missing stop bit.
    pub fn framing_errors(&self) -> usize {
        self.0.borrow().framing_errors
    }
}

impl Contacts for Bench {
    fn io_drive_low(&mut self) {
        self.0.borrow_mut().set_card_drive(true);
    }

    fn io_release(&mut self) {
        self.0.borrow_mut().set_card_drive(false);
    }

    fn io_level(&mut self) -> Level {
        self.0.borrow_mut().sample_io()
    }

    fn clk_level(&mut self) -> Level {
        self.0.borrow_mut().sample_clk()
    }

    fn rst_level(&mut self) -> Level {
        self.0.borrow_mut().sample_rst()
    }

    fn vcc_level(&mut self) -> Level {
        self.0.borrow_mut().sample_vcc()
    }

    fn delay_ticks(&mut self, ticks: u32) {
        self.0.borrow_mut().advance(u64::from(ticks));
    }
}
