//! Inbound command parsing.

use crate::StatusWord;

/// The four short-form APDU shapes, tagged at parse time so handlers never
/// reconstruct them from raw lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApduCase {
    /// Header only.
    Case1,
    /// Header plus Le.
    Case2,
    /// Header, Lc, command data.
    Case3,
    /// Header, Lc, command data, Le.
    Case4,
}

/// A parsed command, borrowing its data field from the receive buffer.
#[derive(Debug, Clone, Copy)]
pub struct Command<'a> {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    /// Command data; empty unless the case carries Lc.
    pub data: &'a [u8],
    /// Expected response length, with the `0 means 256` convention already
    /// applied. `None` when the encoding carried no Le byte.
    pub le: Option<u16>,
    pub case: ApduCase,
}

impl<'a> Command<'a> {
    /// Parse a raw command buffer according to the total-length rules:
    ///
    /// - 4 bytes: case 1;
    /// - 5 bytes: case 2, P3 is Le;
    /// - 5 + Lc bytes with Lc = buffer\[4\]: case 3;
    /// - 5 + Lc + 1 bytes: case 4, the trailing byte is Le;
    /// - anything else is a length error.
    pub fn parse(raw: &'a [u8]) -> Result<Self, StatusWord> {
        if raw.len() < 4 {
            return Err(StatusWord::WRONG_LENGTH);
        }

        let (cla, ins, p1, p2) = (raw[0], raw[1], raw[2], raw[3]);

        let (data, raw_le, case): (&[u8], Option<u8>, ApduCase) = match raw.len() {
            4 => (&[], None, ApduCase::Case1),
            5 => (&[], Some(raw[4]), ApduCase::Case2),
            n => {
                let lc = raw[4] as usize;
                if n == 5 + lc {
                    (&raw[5..5 + lc], None, ApduCase::Case3)
                } else if n == 5 + lc + 1 {
                    (&raw[5..5 + lc], Some(raw[5 + lc]), ApduCase::Case4)
                } else {
                    return Err(StatusWord::WRONG_LENGTH);
                }
            }
        };

        let le = raw_le.map(|byte| if byte == 0 { 256 } else { u16::from(byte) });

        Ok(Command {
            cla,
            ins,
            p1,
            p2,
            data,
            le,
            case,
        })
    }

    /// Lc, the length of the command data field.
    #[inline]
    pub fn lc(&self) -> usize {
        self.data.len()
    }

    /// P1 P2 read as a big-endian 16-bit offset.
    #[inline]
    pub fn offset(&self) -> u16 {
        (u16::from(self.p1) << 8) | u16::from(self.p2)
    }
}
