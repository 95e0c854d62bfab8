//! Minimal card profile.
//!
//! Runs the full card stack against the host bench with a scripted
//! reader: cold reset, ATR, PPS, then a short personalization session
//! (SELECT, VERIFY CHV, SELECT, READ BINARY). Prints the byte stream the
//! card put on the wire. Set `RUST_LOG=debug` (or `trace` for bench
//! internals) to watch the stack at work.

use log::info;

use usim_core::CardRuntime;
use usim_hal::sim::Bench;

const VERIFY_PIN_HEADER: [u8; 5] = [0xA0, 0x20, 0x00, 0x01, 0x08];
const DEFAULT_PIN: [u8; 8] = [0x30, 0x30, 0x30, 0x30, 0xFF, 0xFF, 0xFF, 0xFF];

fn main() {
    env_logger::init();

    let bench = Bench::with_defaults();

    // Reader side of the session.
    bench.expect_card_bytes(15); // ATR
    bench.send(&[0xFF, 0x10, 0xEF]); // PPS: T=0, default parameters
    bench.expect_card_bytes(3); // PPS echo

    bench.send(&[0xA0, 0xA4, 0x00, 0x00, 0x02]); // SELECT MF
    bench.expect_card_bytes(1);
    bench.send(&[0x3F, 0x00]);
    bench.expect_card_bytes(16);

    bench.send(&VERIFY_PIN_HEADER); // VERIFY CHV1
    bench.expect_card_bytes(1);
    bench.send(&DEFAULT_PIN);
    bench.expect_card_bytes(3);

    bench.send(&[0xA0, 0xA4, 0x00, 0x00, 0x02]); // SELECT EF_AD
    bench.expect_card_bytes(1);
    bench.send(&[0x6F, 0xAD]);
    bench.expect_card_bytes(16);

    bench.send(&[0xA0, 0xB0, 0x00, 0x00, 0x02]); // READ BINARY
    bench.expect_card_bytes(5);

    // Card side.
    let mut runtime = CardRuntime::new(bench.clone());
    runtime.power_on();
    for _ in 0..64 {
        if bench.script_done() {
            break;
        }
        runtime.service();
    }
    assert!(bench.script_done(), "reader script did not complete");

    info!("session complete at tick {}", bench.now());

    print!("card wire output:");
    for (index, byte) in bench.card_bytes().iter().enumerate() {
        if index % 16 == 0 {
            println!();
            print!("  ");
        }
        print!("{byte:02X} ");
    }
    println!();
}
