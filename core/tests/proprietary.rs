//! Proprietary-class surfaces (USAT and provisioning), exercised with
//! both features enabled.

use usim_apdu::MAX_RESPONSE_LEN;
use usim_core::Card;

fn apdu(card: &mut Card, bytes: &[u8]) -> Vec<u8> {
    let mut wire = [0u8; MAX_RESPONSE_LEN];
    card.process(bytes, &mut wire).to_vec()
}

fn sw(response: &[u8]) -> u16 {
    let n = response.len();
    (u16::from(response[n - 2]) << 8) | u16::from(response[n - 1])
}

#[test]
fn write_and_read_imsi_record() {
    let mut card = Card::new();
    let fresh = [0x09, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17];

    let mut cmd = vec![0x80, 0xD0, 0x01, 0x00, 0x09];
    cmd.extend_from_slice(&fresh);
    assert_eq!(sw(&apdu(&mut card, &cmd)), 0x9000);

    let read = apdu(&mut card, &[0x80, 0xD1, 0x01, 0x00, 0x09]);
    assert_eq!(sw(&read), 0x9000);
    assert_eq!(&read[..9], &fresh);
}

#[test]
fn reprovisioned_secrets_feed_the_engine() {
    let mut card = Card::new();
    let ki = [0x11u8; 16];
    let opc = [0x22u8; 16];

    let mut cmd = vec![0x80, 0xD0, 0x02, 0x00, 0x10];
    cmd.extend_from_slice(&ki);
    assert_eq!(sw(&apdu(&mut card, &cmd)), 0x9000);

    let mut cmd = vec![0x80, 0xD0, 0x03, 0x00, 0x10];
    cmd.extend_from_slice(&opc);
    assert_eq!(sw(&apdu(&mut card, &cmd)), 0x9000);

    let rand = [0x5Au8; 16];
    let mut auth = vec![0x80, 0xA0, 0x00, 0x00, 0x10];
    auth.extend_from_slice(&rand);
    let response = apdu(&mut card, &auth);
    assert_eq!(sw(&response), 0x9000);

    let expected = usim_auth::AuthVector::derive(&rand, &ki, &opc);
    assert_eq!(&response[..54], &expected.to_wire());
}

#[test]
fn xor_auth_skips_the_pin_gate() {
    let mut card = Card::new();
    let mut auth = vec![0x80, 0xA0, 0x00, 0x00, 0x10];
    auth.extend_from_slice(&[0u8; 16]);
    assert_eq!(sw(&apdu(&mut card, &auth)), 0x9000);

    // The session still records the authentication.
    let status = apdu(&mut card, &[0xA0, 0xF2, 0x00, 0x00, 0x05]);
    assert_eq!(status[2] & 0x02, 0x02);
}

#[test]
fn pin_record_replaces_chv1() {
    let mut card = Card::new();
    let mut cmd = vec![0x80, 0xD0, 0x04, 0x00, 0x08];
    cmd.extend_from_slice(b"4321\xFF\xFF\xFF\xFF");
    assert_eq!(sw(&apdu(&mut card, &cmd)), 0x9000);

    let mut verify = vec![0xA0, 0x20, 0x00, 0x01, 0x08];
    verify.extend_from_slice(b"4321\xFF\xFF\xFF\xFF");
    assert_eq!(sw(&apdu(&mut card, &verify)), 0x9000);
}

#[test]
fn soft_reset_clears_session_not_files() {
    let mut card = Card::new();

    let mut verify = vec![0xA0, 0x20, 0x00, 0x01, 0x08];
    verify.extend_from_slice(b"0000\xFF\xFF\xFF\xFF");
    assert_eq!(sw(&apdu(&mut card, &verify)), 0x9000);
    assert_eq!(
        sw(&apdu(&mut card, &[0xA0, 0xA4, 0x00, 0x00, 0x02, 0x6F, 0xAD])),
        0x9000
    );
    assert_eq!(
        sw(&apdu(&mut card, &[0xA0, 0xD6, 0x00, 0x00, 0x02, 0xA5, 0x5A])),
        0x9000
    );

    assert_eq!(sw(&apdu(&mut card, &[0x80, 0xE0, 0x00, 0x00])), 0x9000);

    let status = apdu(&mut card, &[0xA0, 0xF2, 0x00, 0x00, 0x05]);
    assert_eq!(&status[..5], &[0x02, 0x00, 0x00, 0x03, 0x0A]);

    // File contents survived the soft reset.
    assert_eq!(sw(&apdu(&mut card, &verify)), 0x9000);
    assert_eq!(
        sw(&apdu(&mut card, &[0xA0, 0xA4, 0x00, 0x00, 0x02, 0x6F, 0xAD])),
        0x9000
    );
    assert_eq!(
        apdu(&mut card, &[0xA0, 0xB0, 0x00, 0x00, 0x02]),
        [0xA5, 0x5A, 0x90, 0x00]
    );
}

#[test]
fn unknown_config_record() {
    let mut card = Card::new();
    assert_eq!(sw(&apdu(&mut card, &[0x80, 0xD0, 0x07, 0x00, 0x01, 0xAA])), 0x6B00);
    assert_eq!(sw(&apdu(&mut card, &[0x80, 0xD1, 0x07, 0x00, 0x01])), 0x6B00);
}

#[test]
fn config_status_record() {
    let mut card = Card::new();
    let read = apdu(&mut card, &[0x80, 0xD1, 0x05, 0x00, 0x04]);
    assert_eq!(sw(&read), 0x9000);
    assert_eq!(&read[..4], &[0x00, 0x03, 0x02, 0x00]);
}

#[test]
fn usat_data_download_tags() {
    let mut card = Card::new();

    // DISPLAY TEXT: tag 21, five payload bytes.
    let cmd = [0x80, 0x81, 0x00, 0x00, 0x07, 0x21, 0x05, 1, 2, 3, 4, 5];
    let response = apdu(&mut card, &cmd);
    assert_eq!(sw(&response), 0x9000);
    assert_eq!(&response[..1], &[0x00]);

    // GET INPUT answers the canned text.
    let cmd = [0x80, 0x81, 0x00, 0x00, 0x05, 0x23, 0x03, 1, 2, 3];
    let response = apdu(&mut card, &cmd);
    assert_eq!(&response[..6], &[0x00, 0x04, b'T', b'E', b'S', b'T']);

    // Unknown tag.
    let cmd = [0x80, 0x81, 0x00, 0x00, 0x05, 0x99, 0x03, 1, 2, 3];
    assert_eq!(sw(&apdu(&mut card, &cmd)), 0x6D00);

    // Envelope length disagreeing with the tag length.
    let cmd = [0x80, 0x81, 0x00, 0x00, 0x06, 0x21, 0x03, 1, 2, 3, 4];
    assert_eq!(sw(&apdu(&mut card, &cmd)), 0x6700);
}

#[test]
fn usat_envelope_and_fetch() {
    let mut card = Card::new();

    let response = apdu(&mut card, &[0x80, 0xC3, 0x00, 0x00, 0x03, 1, 2, 3]);
    assert_eq!(sw(&response), 0x9000);
    assert_eq!(&response[..1], &[0x00]);

    let response = apdu(&mut card, &[0x80, 0x12, 0x00, 0x00, 0x0F]);
    assert_eq!(sw(&response), 0x9000);
    assert_eq!(response.len(), 15 + 2);
    assert_eq!(response[0], 0x21);
    assert_eq!(&response[6..15], b"USIM TEST");
}

#[test]
fn unknown_ins_on_proprietary_class() {
    let mut card = Card::new();
    assert_eq!(sw(&apdu(&mut card, &[0x80, 0xFF, 0x00, 0x00, 0x00])), 0x6D00);
}
