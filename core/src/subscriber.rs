//! Subscriber record: identity, long-term key material and PIN state.

/// The provisioned subscriber. Created at power-on; mutated only by the
/// CHV commands, the provisioning surface and the reset path.
#[derive(Debug, Clone)]
pub struct Subscriber {
    /// IMSI record (the readable copy lives in EF_IMSI).
    pub imsi: [u8; 9],
    /// Long-term key shadow; the authoritative copy is masked in EF_KEY.
    pub ki: [u8; 16],
    /// Operator-constant shadow; the authoritative copy is masked in EF_OPc.
    pub opc: [u8; 16],
    /// Sequence number.
    pub sqn: [u8; 6],
    /// Authentication management field.
    pub amf: [u8; 2],
    /// CHV1, right-padded with 0xFF.
    pub pin1: [u8; 8],
    /// Unblock key for CHV1.
    pub puk1: [u8; 8],
    /// Remaining CHV1 attempts (0 means blocked).
    pub pin1_retries: u8,
    /// Remaining PUK1 attempts.
    pub puk1_retries: u8,
}

/// Default CHV1 value: "0000" padded to eight bytes.
const DEFAULT_PIN1: [u8; 8] = [b'0', b'0', b'0', b'0', 0xFF, 0xFF, 0xFF, 0xFF];

impl Subscriber {
    /// Factory-default subscriber.
    pub fn new() -> Self {
        Subscriber {
            imsi: [0; 9],
            ki: [0; 16],
            opc: [0; 16],
            sqn: [0; 6],
            amf: [0; 2],
            pin1: DEFAULT_PIN1,
            puk1: [0; 8],
            pin1_retries: 3,
            puk1_retries: 10,
        }
    }

    /// Constant-time comparison of a candidate against CHV1.
    pub fn pin_matches(&self, candidate: &[u8; 8]) -> bool {
        let mut diff = 0u8;
        for (stored, given) in self.pin1.iter().zip(candidate.iter()) {
            diff |= stored ^ given;
        }
        diff == 0
    }
}

impl Default for Subscriber {
    fn default() -> Self {
        Self::new()
    }
}
