//! Provisioning surface (feature `config-apdu`, class 0x80).
//!
//! Bench-side commands for writing subscriber material onto the card and
//! reading diagnostics back. Secrets written here pass through the file
//! store's re-masking helper, so they land masked like the factory seeds.

use log::debug;

use usim_apdu::{Command, Response, StatusWord};
use usim_fs::{FileId, REGION_CAP};

use crate::card::Card;
use crate::handlers::derive_vector;
use crate::CARD_VERSION;

/// Record selectors carried in P1.
const RECORD_IMSI: u8 = 0x01;
const RECORD_KEY: u8 = 0x02;
const RECORD_OPC: u8 = 0x03;
const RECORD_PIN: u8 = 0x04;
const RECORD_STATUS: u8 = 0x05;

/// WRITE CONFIG (INS D0): provision one record selected by P1.
pub(crate) fn write_config(
    card: &mut Card,
    cmd: &Command<'_>,
    _resp: &mut Response,
) -> Result<(), StatusWord> {
    if cmd.lc() == 0 {
        return Err(StatusWord::WRONG_LENGTH);
    }

    match cmd.p1 {
        RECORD_IMSI => {
            if cmd.lc() != 9 {
                return Err(StatusWord::WRONG_LENGTH);
            }
            let file = card
                .files
                .find_mut(FileId::EF_IMSI)
                .ok_or(StatusWord::MEMORY_PROBLEM)?;
            file.write_at(0, cmd.data)
                .map_err(|_| StatusWord::MEMORY_PROBLEM)?;
            debug!("CONFIG: IMSI updated");
        }
        RECORD_KEY => {
            if cmd.lc() != 16 {
                return Err(StatusWord::WRONG_LENGTH);
            }
            let mut plain = [0u8; REGION_CAP];
            plain.copy_from_slice(cmd.data);
            card.files
                .write_secret(FileId::EF_KEY, &plain)
                .map_err(|_| StatusWord::MEMORY_PROBLEM)?;
            debug!("CONFIG: Ki updated");
        }
        RECORD_OPC => {
            if cmd.lc() != 16 {
                return Err(StatusWord::WRONG_LENGTH);
            }
            let mut plain = [0u8; REGION_CAP];
            plain.copy_from_slice(cmd.data);
            card.files
                .write_secret(FileId::EF_OPC, &plain)
                .map_err(|_| StatusWord::MEMORY_PROBLEM)?;
            debug!("CONFIG: OPc updated");
        }
        RECORD_PIN => {
            if cmd.lc() != 8 {
                return Err(StatusWord::WRONG_LENGTH);
            }
            card.subscriber.pin1.copy_from_slice(cmd.data);
            card.subscriber.pin1_retries = 3;
            debug!("CONFIG: PIN updated");
        }
        _ => {
            debug!("CONFIG: unknown record {:02X}", cmd.p1);
            return Err(StatusWord::WRONG_PARAMETERS);
        }
    }

    Ok(())
}

/// READ CONFIG (INS D1): read one record selected by P1.
pub(crate) fn read_config(
    card: &mut Card,
    cmd: &Command<'_>,
    resp: &mut Response,
) -> Result<(), StatusWord> {
    match cmd.p1 {
        RECORD_IMSI => {
            let data = card
                .files
                .find(FileId::EF_IMSI)
                .and_then(|file| file.data())
                .ok_or(StatusWord::MEMORY_PROBLEM)?;
            resp.write(data);
            debug!("CONFIG: reading IMSI");
        }
        RECORD_STATUS => {
            resp.write(&[
                card.session.state_byte(),
                card.subscriber.pin1_retries,
                CARD_VERSION.major,
                CARD_VERSION.minor,
            ]);
            debug!("CONFIG: reading status");
        }
        _ => {
            debug!("CONFIG: cannot read record {:02X}", cmd.p1);
            return Err(StatusWord::WRONG_PARAMETERS);
        }
    }

    Ok(())
}

/// XOR AUTH (INS A0 under the proprietary class): run the engine without
/// the CHV1 gate; bench-side known-answer checks use this.
pub(crate) fn xor_auth(
    card: &mut Card,
    cmd: &Command<'_>,
    resp: &mut Response,
) -> Result<(), StatusWord> {
    if cmd.lc() != 16 {
        return Err(StatusWord::WRONG_LENGTH);
    }

    let mut rand = [0u8; 16];
    rand.copy_from_slice(cmd.data);

    let vector = derive_vector(card, &rand).ok_or_else(|| {
        debug!("XOR AUTH: failed");
        StatusWord::AUTHENTICATION_FAILED
    })?;

    resp.write(&vector.to_wire());
    card.session.apply_auth(&vector);
    debug!("XOR AUTH: success");
    Ok(())
}

/// RESET SIM (INS E0): soft reset of session state and retry counters
/// without touching the transport or file contents.
pub(crate) fn reset_sim(
    card: &mut Card,
    _cmd: &Command<'_>,
    _resp: &mut Response,
) -> Result<(), StatusWord> {
    card.reset_session();
    debug!("CONFIG: soft reset performed");
    Ok(())
}
