//! USAT surface (feature `usat`, class 0x80).
//!
//! Canned acknowledge stubs for the toolkit envelope commands; enough for
//! a terminal to exercise the proprietary class without a real proactive
//! session behind it.

use log::debug;

use usim_apdu::{Command, Response, StatusWord};

use crate::card::Card;

const TAG_DISPLAY_TEXT: u8 = 0x21;
const TAG_GET_INPUT: u8 = 0x23;
const TAG_SELECT_ITEM: u8 = 0x24;
const TAG_SETUP_MENU: u8 = 0x25;
const TAG_SEND_SMS: u8 = 0x27;

const RESPONSE_OK: u8 = 0x00;

/// DATA DOWNLOAD (INS 81): parse a tag/length envelope and acknowledge
/// per tag.
pub(crate) fn data_download(
    _card: &mut Card,
    cmd: &Command<'_>,
    resp: &mut Response,
) -> Result<(), StatusWord> {
    if cmd.lc() < 5 {
        return Err(StatusWord::WRONG_LENGTH);
    }

    let tag = cmd.data[0];
    let length = cmd.data[1] as usize;
    if cmd.lc() != 2 + length {
        return Err(StatusWord::WRONG_LENGTH);
    }

    match tag {
        TAG_DISPLAY_TEXT => {
            resp.push(RESPONSE_OK);
            debug!("USAT: DISPLAY TEXT processed");
        }
        TAG_GET_INPUT => {
            resp.write(&[RESPONSE_OK, 0x04, b'T', b'E', b'S', b'T']);
            debug!("USAT: GET INPUT processed");
        }
        TAG_SELECT_ITEM => {
            resp.push(0x01);
            debug!("USAT: SELECT ITEM processed");
        }
        TAG_SETUP_MENU => {
            resp.push(RESPONSE_OK);
            debug!("USAT: SETUP MENU processed");
        }
        TAG_SEND_SMS => {
            resp.push(RESPONSE_OK);
            debug!("USAT: SEND SMS processed");
        }
        _ => {
            debug!("USAT: unknown tag {tag:02X}");
            return Err(StatusWord::INS_NOT_SUPPORTED);
        }
    }

    Ok(())
}

/// ENVELOPE (INS C3): flat acknowledge.
pub(crate) fn envelope(
    _card: &mut Card,
    _cmd: &Command<'_>,
    resp: &mut Response,
) -> Result<(), StatusWord> {
    resp.push(RESPONSE_OK);
    debug!("USAT: ENVELOPE processed");
    Ok(())
}

/// FETCH (INS 12): report the canned pending DISPLAY TEXT command.
pub(crate) fn fetch(
    _card: &mut Card,
    _cmd: &Command<'_>,
    resp: &mut Response,
) -> Result<(), StatusWord> {
    resp.write(&[
        TAG_DISPLAY_TEXT,
        0x0D,
        0x81,
        0x01,
        0x82,
        0x08,
        b'U',
        b'S',
        b'I',
        b'M',
        b' ',
        b'T',
        b'E',
        b'S',
        b'T',
    ]);
    debug!("USAT: FETCH, display text pending");
    Ok(())
}
