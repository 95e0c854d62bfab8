//! The standard command handlers.
//!
//! Each handler validates its command shape, consults the file store or
//! the subscriber record, fills the response data field on success, and
//! reports failure as a status word. None of them touch the line; the
//! runtime owns all transport interaction.

use log::debug;

use usim_apdu::{Command, Response, StatusWord, MAX_DATA_LEN};
use usim_auth::AuthVector;
use usim_fs::{AccessKind, FileId, FileStore, REGION_CAP};

use crate::card::Card;
use crate::session::{CurrentFile, SessionFlags};
use crate::CARD_VERSION;

/// SELECT FILE (INS A4): select by 16-bit identifier, answer a 13-byte
/// FCP template.
pub(crate) fn select_file(
    card: &mut Card,
    cmd: &Command<'_>,
    resp: &mut Response,
) -> Result<(), StatusWord> {
    if cmd.lc() != 2 {
        return Err(StatusWord::WRONG_LENGTH);
    }
    if matches!(cmd.le, Some(le) if le < 13) {
        return Err(StatusWord::WRONG_LENGTH);
    }

    let id = FileId::from_be_bytes([cmd.data[0], cmd.data[1]]);
    let file = card.files.find(id).ok_or(StatusWord::FILE_NOT_FOUND)?;
    if !file.permits(AccessKind::Select, card.session.rights()) {
        return Err(StatusWord::SECURITY_STATUS);
    }

    let kind = file.kind();
    let size = file.size();
    let name = file.name();

    card.current_file = CurrentFile { id, kind, size };
    card.session.flags.insert(SessionFlags::SELECTED);

    let size_bytes = size.to_be_bytes();
    let id_bytes = id.to_be_bytes();
    resp.write(&[
        0x62, // FCP template tag
        0x0B,
        0x80, // file size
        0x02,
        size_bytes[0],
        size_bytes[1],
        0x82, // file descriptor
        0x01,
        kind.fcp_descriptor(),
        0x83, // file identifier
        0x02,
        id_bytes[0],
        id_bytes[1],
    ]);

    debug!("SELECT FILE: {name}");
    Ok(())
}

/// READ BINARY (INS B0): read from the currently selected EF at the
/// offset carried in P1 P2.
pub(crate) fn read_binary(
    card: &mut Card,
    cmd: &Command<'_>,
    resp: &mut Response,
) -> Result<(), StatusWord> {
    let offset = cmd.offset() as usize;

    let file = card
        .files
        .find(card.current_file.id)
        .ok_or(StatusWord::FILE_NOT_FOUND)?;
    if !file.kind().is_ef() {
        return Err(StatusWord::COMMAND_NOT_ALLOWED);
    }
    if !file.permits(AccessKind::Read, card.session.rights()) {
        return Err(StatusWord::SECURITY_STATUS);
    }

    let size = file.size() as usize;
    if offset >= size || file.data().is_none() {
        return Err(StatusWord::WRONG_PARAMETERS);
    }

    let available = size - offset;
    let requested = match cmd.le {
        Some(256) => available.min(256),
        Some(le) if (le as usize) < available => le as usize,
        Some(_) => available,
        // No Le on the wire (unreachable over T=0 short form): cap at the
        // short-form response ceiling.
        None => available.min(MAX_DATA_LEN),
    };

    if FileStore::is_secret(card.current_file.id) {
        let mut scratch = [0u8; REGION_CAP];
        if let Some(plain) = card.files.read_into(card.current_file.id, &mut scratch) {
            resp.write(&plain[offset..offset + requested]);
        }
    } else if let Some(data) = file.data() {
        resp.write(&data[offset..offset + requested]);
    }

    debug!("READ BINARY: {} bytes", resp.data_len());
    Ok(())
}

/// UPDATE BINARY (INS D6): write the command data into the currently
/// selected EF at the offset in P1 P2, growing the valid-byte count.
pub(crate) fn update_binary(
    card: &mut Card,
    cmd: &Command<'_>,
    _resp: &mut Response,
) -> Result<(), StatusWord> {
    let offset = cmd.offset() as usize;

    let file = card
        .files
        .find(card.current_file.id)
        .ok_or(StatusWord::FILE_NOT_FOUND)?;
    if !file.kind().is_ef() {
        return Err(StatusWord::COMMAND_NOT_ALLOWED);
    }
    if !file.permits(AccessKind::Update, card.session.rights()) {
        return Err(StatusWord::SECURITY_STATUS);
    }
    if cmd.lc() == 0 {
        return Err(StatusWord::WRONG_LENGTH);
    }
    if offset + cmd.lc() > file.size() as usize {
        return Err(StatusWord::WRONG_PARAMETERS);
    }

    let file = card
        .files
        .find_mut(card.current_file.id)
        .ok_or(StatusWord::FILE_NOT_FOUND)?;
    file.write_at(offset, cmd.data)
        .map_err(|_| StatusWord::MEMORY_PROBLEM)?;

    debug!("UPDATE BINARY: {} bytes written", cmd.lc());
    Ok(())
}

/// Shared CHV1 check with retry bookkeeping. Returns `Ok` when the
/// candidate matches (counter restored), or the failure word with the
/// counter decremented.
fn check_chv1(card: &mut Card, candidate: &[u8]) -> Result<(), StatusWord> {
    let mut pin = [0u8; 8];
    pin.copy_from_slice(candidate);

    if card.subscriber.pin_matches(&pin) {
        card.subscriber.pin1_retries = 3;
        return Ok(());
    }

    card.subscriber.pin1_retries = card.subscriber.pin1_retries.saturating_sub(1);
    if card.subscriber.pin1_retries == 0 {
        debug!("CHV1 blocked");
        Err(StatusWord::PIN_BLOCKED)
    } else {
        debug!("CHV1 incorrect, {} attempts left", card.subscriber.pin1_retries);
        Err(StatusWord::remaining_attempts(card.subscriber.pin1_retries))
    }
}

/// VERIFY CHV (INS 20): check CHV1, addressed through bit 0 of P2.
pub(crate) fn verify_chv(
    card: &mut Card,
    cmd: &Command<'_>,
    _resp: &mut Response,
) -> Result<(), StatusWord> {
    if cmd.lc() != 8 {
        return Err(StatusWord::WRONG_LENGTH);
    }
    if cmd.p2 & 0x01 == 0 {
        return Err(StatusWord::WRONG_PARAMETERS);
    }
    if card.subscriber.pin1_retries == 0 {
        return Err(StatusWord::PIN_BLOCKED);
    }

    check_chv1(card, cmd.data)?;
    card.session.flags.insert(SessionFlags::PIN_VERIFIED);
    debug!("VERIFY CHV: PIN correct");
    Ok(())
}

/// CHANGE CHV (INS 24): verify the current CHV1 and install the new one.
pub(crate) fn change_chv(
    card: &mut Card,
    cmd: &Command<'_>,
    _resp: &mut Response,
) -> Result<(), StatusWord> {
    if cmd.lc() != 16 {
        return Err(StatusWord::WRONG_LENGTH);
    }
    if cmd.p2 & 0x01 == 0 {
        return Err(StatusWord::WRONG_PARAMETERS);
    }
    if card.subscriber.pin1_retries == 0 {
        return Err(StatusWord::PIN_BLOCKED);
    }

    check_chv1(card, &cmd.data[..8])?;

    card.subscriber.pin1.copy_from_slice(&cmd.data[8..16]);
    card.subscriber.pin1_retries = 3;
    card.session.flags.insert(SessionFlags::PIN_VERIFIED);
    debug!("CHANGE CHV: PIN updated");
    Ok(())
}

/// AUTHENTICATE (INS 88): derive RES ‖ CK ‖ IK ‖ AK ‖ Kc from the RAND
/// in the command data. Requires a verified CHV1.
pub(crate) fn authenticate(
    card: &mut Card,
    cmd: &Command<'_>,
    resp: &mut Response,
) -> Result<(), StatusWord> {
    if cmd.lc() < 16 {
        return Err(StatusWord::WRONG_LENGTH);
    }
    if !card.session.flags.contains(SessionFlags::PIN_VERIFIED) {
        return Err(StatusWord::SECURITY_STATUS);
    }
    // Le gate kept exactly as shipped: absent, 256, or at least the full
    // 54-byte vector.
    if matches!(cmd.le, Some(le) if le != 256 && le < 54) {
        return Err(StatusWord::WRONG_LENGTH);
    }

    let mut rand = [0u8; 16];
    rand.copy_from_slice(&cmd.data[..16]);

    let vector = derive_vector(card, &rand).ok_or_else(|| {
        debug!("AUTHENTICATE: failed");
        StatusWord::AUTHENTICATION_FAILED
    })?;

    resp.write(&vector.to_wire());
    card.session.apply_auth(&vector);
    debug!("AUTHENTICATE: success");
    Ok(())
}

/// Fetch Ki and OPc through the unmasking helper and run the engine.
/// `None` when either secret is absent or not exactly 16 bytes.
pub(crate) fn derive_vector(card: &Card, rand: &[u8; 16]) -> Option<AuthVector> {
    let mut ki = [0u8; REGION_CAP];
    let mut opc = [0u8; REGION_CAP];
    {
        let mut scratch = [0u8; REGION_CAP];
        let plain = card.files.read_into(FileId::EF_KEY, &mut scratch)?;
        if plain.len() != 16 {
            return None;
        }
        ki.copy_from_slice(plain);
    }
    {
        let mut scratch = [0u8; REGION_CAP];
        let plain = card.files.read_into(FileId::EF_OPC, &mut scratch)?;
        if plain.len() != 16 {
            return None;
        }
        opc.copy_from_slice(plain);
    }
    Some(AuthVector::derive(rand, &ki, &opc))
}

/// GET RESPONSE (INS C0): answers a fixed synthetic pattern rather than a
/// saved previous response. Kept byte-for-byte for compatibility with the
/// shipped behavior; TS 102 221 conformance is explicitly not claimed.
pub(crate) fn get_response(
    _card: &mut Card,
    cmd: &Command<'_>,
    resp: &mut Response,
) -> Result<(), StatusWord> {
    let requested = usize::from(cmd.le.unwrap_or(256));
    let count = requested.min(32);
    for index in 0..count {
        resp.push(0x10 + index as u8);
    }
    Ok(())
}

/// STATUS (INS F2): version pair, session state byte and retry counters.
pub(crate) fn status(
    card: &mut Card,
    cmd: &Command<'_>,
    resp: &mut Response,
) -> Result<(), StatusWord> {
    if matches!(cmd.le, Some(le) if le < 5) {
        return Err(StatusWord::WRONG_LENGTH);
    }

    resp.write(&[
        CARD_VERSION.major,
        CARD_VERSION.minor,
        card.session.state_byte(),
        card.subscriber.pin1_retries,
        card.subscriber.puk1_retries,
    ]);
    Ok(())
}
