//! Full-stack sessions over the bit-level bench: reset, ATR, PPS,
//! procedure bytes and command exchanges exactly as they appear on the
//! I/O contact.

use usim_core::CardRuntime;
use usim_hal::sim::Bench;
use usim_transport::ATR;

/// Drive the runtime until the reader script has fully played out.
fn run_to_completion(runtime: &mut CardRuntime<Bench>, bench: &Bench) {
    for _ in 0..64 {
        if bench.script_done() {
            return;
        }
        runtime.service();
    }
    panic!("reader script did not complete");
}

#[test]
fn select_session_on_the_wire() {
    let bench = Bench::with_defaults();

    bench.expect_card_bytes(15); // ATR
    bench.send(&[0xFF, 0x10, 0xEF]); // PPS request
    bench.expect_card_bytes(3); // PPS echo
    bench.send(&[0xA0, 0xA4, 0x00, 0x00, 0x02]); // SELECT MF header
    bench.expect_card_bytes(1); // procedure byte: INS ack
    bench.send(&[0x3F, 0x00]); // file identifier
    bench.expect_card_bytes(16); // NULL + FCP + SW

    let mut runtime = CardRuntime::new(bench.clone());
    runtime.power_on();
    run_to_completion(&mut runtime, &bench);

    let bytes = bench.card_bytes();
    assert_eq!(&bytes[..15], &ATR);
    assert_eq!(&bytes[15..18], &[0xFF, 0x10, 0xEF]);
    assert_eq!(bytes[18], 0xA4); // data-phase ack
    assert_eq!(bytes[19], 0x60); // NULL before the status
    assert_eq!(
        &bytes[20..],
        &[0x62, 0x0B, 0x80, 0x02, 0x00, 0x00, 0x82, 0x01, 0x38, 0x83, 0x02, 0x3F, 0x00, 0x90,
          0x00]
    );
    assert_eq!(bench.parity_errors(), 0);
    assert_eq!(bench.framing_errors(), 0);
}

#[test]
fn case2_command_without_pps() {
    let bench = Bench::with_defaults();

    bench.expect_card_bytes(15); // ATR
    bench.send(&[0xA0, 0xF2, 0x00, 0x00, 0x05]); // STATUS
    bench.expect_card_bytes(8); // NULL + 5 data + SW

    let mut runtime = CardRuntime::new(bench.clone());
    runtime.power_on();
    run_to_completion(&mut runtime, &bench);

    let bytes = bench.card_bytes();
    // The header byte 0xA0 arrived inside the PPS window, was pushed back
    // and replayed to the command loop.
    assert_eq!(
        &bytes[15..],
        &[0x60, 0x02, 0x00, 0x00, 0x03, 0x0A, 0x90, 0x00]
    );
}

#[test]
fn warm_reset_reinitializes_the_session() {
    let bench = Bench::with_defaults();

    bench.expect_card_bytes(15); // cold ATR
    bench.send(&[0xA0, 0x20, 0x00, 0x01, 0x08]); // VERIFY CHV header
    bench.expect_card_bytes(1); // INS ack
    bench.send(&[0x30, 0x30, 0x30, 0x30, 0xFF, 0xFF, 0xFF, 0xFF]);
    bench.expect_card_bytes(3); // NULL + 90 00
    bench.pulse_reset(100_000); // warm reset
    bench.expect_card_bytes(15); // fresh ATR
    bench.send(&[0xA0, 0xF2, 0x00, 0x00, 0x05]); // STATUS
    bench.expect_card_bytes(8);

    let mut runtime = CardRuntime::new(bench.clone());
    runtime.power_on();
    run_to_completion(&mut runtime, &bench);

    let bytes = bench.card_bytes();
    assert_eq!(&bytes[16..19], &[0x60, 0x90, 0x00]);
    assert_eq!(&bytes[19..34], &ATR);
    // Post-reset STATUS: idle state, retry counters restored.
    assert_eq!(
        &bytes[34..],
        &[0x60, 0x02, 0x00, 0x00, 0x03, 0x0A, 0x90, 0x00]
    );
}
