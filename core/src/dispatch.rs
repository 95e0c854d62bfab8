//! CLA/INS routing.
//!
//! Two lookup tables keyed by instruction byte: one for the standard
//! classes (0x00 and 0xA0, accepted interchangeably) and one for the
//! proprietary class 0x80 carrying the optional surfaces. An unknown
//! class answers 6E00, an unmapped instruction 6D00; a handler's own
//! status word is preserved on failure.

use log::debug;

use usim_apdu::{cla, ins, Command, Response, StatusWord};

use crate::card::Card;
use crate::handlers;

/// A command handler: fills the response data on success and reports
/// failure through its status word.
pub(crate) type Handler = fn(&mut Card, &Command<'_>, &mut Response) -> Result<(), StatusWord>;

/// The standard APDU surface.
const STANDARD_HANDLERS: &[(u8, Handler)] = &[
    (ins::SELECT_FILE, handlers::select_file),
    (ins::READ_BINARY, handlers::read_binary),
    (ins::UPDATE_BINARY, handlers::update_binary),
    (ins::VERIFY_CHV, handlers::verify_chv),
    (ins::CHANGE_CHV, handlers::change_chv),
    (ins::AUTHENTICATE, handlers::authenticate),
    (ins::GET_RESPONSE, handlers::get_response),
    (ins::STATUS, handlers::status),
];

/// The USAT part of the proprietary surface.
#[cfg(feature = "usat")]
const USAT_HANDLERS: &[(u8, Handler)] = &[
    (ins::USAT_DATA_DOWNLOAD, crate::usat::data_download),
    (ins::USAT_ENVELOPE, crate::usat::envelope),
    (ins::USAT_FETCH, crate::usat::fetch),
];

/// The provisioning part of the proprietary surface.
#[cfg(feature = "config-apdu")]
const CONFIG_HANDLERS: &[(u8, Handler)] = &[
    (ins::WRITE_CONFIG, crate::config::write_config),
    (ins::READ_CONFIG, crate::config::read_config),
    (ins::XOR_AUTH, crate::config::xor_auth),
    (ins::RESET_SIM, crate::config::reset_sim),
];

fn lookup(table: &[(u8, Handler)], instruction: u8) -> Option<Handler> {
    table
        .iter()
        .find(|(byte, _)| *byte == instruction)
        .map(|(_, handler)| *handler)
}

impl Card {
    /// Route a parsed command to its handler.
    pub(crate) fn dispatch(
        &mut self,
        cmd: &Command<'_>,
        resp: &mut Response,
    ) -> Result<(), StatusWord> {
        match cmd.cla {
            cla::STANDARD | cla::GSM => match lookup(STANDARD_HANDLERS, cmd.ins) {
                Some(handler) => handler(self, cmd, resp),
                None => {
                    debug!("APDU: instruction {:02X} not supported", cmd.ins);
                    Err(StatusWord::INS_NOT_SUPPORTED)
                }
            },
            #[cfg(any(feature = "usat", feature = "config-apdu"))]
            cla::PROPRIETARY => {
                #[cfg(feature = "usat")]
                if let Some(handler) = lookup(USAT_HANDLERS, cmd.ins) {
                    return handler(self, cmd, resp);
                }
                #[cfg(feature = "config-apdu")]
                if let Some(handler) = lookup(CONFIG_HANDLERS, cmd.ins) {
                    return handler(self, cmd, resp);
                }
                debug!("APDU: instruction {:02X} not supported", cmd.ins);
                Err(StatusWord::INS_NOT_SUPPORTED)
            }
            _ => Err(StatusWord::CLA_NOT_SUPPORTED),
        }
    }
}
