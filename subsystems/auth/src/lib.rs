//! # Authentication Engine
//!
//! The deliberately simplified UMTS authentication: every quantity is an
//! XOR mix of RAND, Ki and OPc with fixed rotations. This is a mock of
//! MILENAGE with the same vector shape (RES, CK, IK, AK, Kc), not a
//! cryptographic algorithm; it exists so the AUTHENTICATE flow, session
//! key handling and wire format can be exercised end to end.
//!
//! The engine is pure: callers fetch Ki and OPc through the file store's
//! unmasking helper and pass them in.

#![no_std]

use usim_fs::XOR_MASK;

/// Length of the serialized vector: RES ‖ CK ‖ IK ‖ AK ‖ Kc.
pub const AUTH_RESPONSE_LEN: usize = 8 + 16 + 16 + 6 + 8;

/// One derived authentication vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthVector {
    /// Authentication response.
    pub res: [u8; 8],
    /// Cipher key.
    pub ck: [u8; 16],
    /// Integrity key.
    pub ik: [u8; 16],
    /// Anonymity key.
    pub ak: [u8; 6],
    /// GSM compatibility key.
    pub kc: [u8; 8],
}

impl AuthVector {
    /// Mix RAND, Ki and OPc into a full vector.
    ///
    /// RES packs the low nibbles of `T[i] = RAND[i] ^ Ki[i] ^ OPc[i]`:
    /// lane `i` takes the low nibble of `T[i]` and the low nibble of
    /// `T[i + 8]` shifted into the high half. CK, IK and AK are the same
    /// mix under fixed index rotations, and Kc folds CK onto itself.
    pub fn derive(rand: &[u8; 16], ki: &[u8; 16], opc: &[u8; 16]) -> Self {
        let mut t = [0u8; 16];
        for i in 0..16 {
            t[i] = rand[i] ^ ki[i] ^ opc[i];
        }

        let mut res = [0u8; 8];
        for i in 0..8 {
            res[i] = (t[i] & 0x0F) | ((t[i + 8] & 0x0F) << 4);
        }

        let mut ck = [0u8; 16];
        for i in 0..16 {
            ck[i] = rand[i] ^ ki[(i + 3) % 16] ^ opc[(i + 7) % 16];
        }

        let mut ik = [0u8; 16];
        for i in 0..16 {
            ik[i] = rand[(i + 5) % 16] ^ ki[(i + 11) % 16] ^ opc[(i + 13) % 16];
        }

        let mut ak = [0u8; 6];
        for i in 0..6 {
            ak[i] = rand[i + 2] ^ ki[i + 5] ^ opc[i + 9];
        }

        let mut kc = [0u8; 8];
        for i in 0..8 {
            kc[i] = ck[i] ^ ck[i + 8];
        }

        AuthVector { res, ck, ik, ak, kc }
    }

    /// Serialize as RES ‖ CK ‖ IK ‖ AK ‖ Kc.
    pub fn to_wire(&self) -> [u8; AUTH_RESPONSE_LEN] {
        let mut out = [0u8; AUTH_RESPONSE_LEN];
        out[..8].copy_from_slice(&self.res);
        out[8..24].copy_from_slice(&self.ck);
        out[24..40].copy_from_slice(&self.ik);
        out[40..46].copy_from_slice(&self.ak);
        out[46..54].copy_from_slice(&self.kc);
        out
    }
}

/// Expand `input` into `output` with the fixed mask as keystream.
pub fn derive_keys(input: &[u8], output: &mut [u8]) {
    for (i, byte) in output.iter_mut().enumerate() {
        *byte = input[i % input.len()] ^ XOR_MASK[i % XOR_MASK.len()];
    }
}

/// Check a keystream MAC over `data`. Lane `i` of the MAC folds every
/// data byte with a sliding window of the mask.
pub fn verify_mac(data: &[u8], expected: &[u8]) -> bool {
    if expected.is_empty() || expected.len() > 8 {
        return false;
    }
    let mut calculated = [0u8; 8];
    for (i, lane) in calculated.iter_mut().take(expected.len()).enumerate() {
        for (j, &byte) in data.iter().enumerate() {
            *lane ^= byte ^ XOR_MASK[(i + j) % XOR_MASK.len()];
        }
    }
    calculated[..expected.len()] == *expected
}

#[cfg(test)]
mod tests {
    use super::*;

    const KI: [u8; 16] = [
        0x46, 0x5B, 0x5C, 0xE8, 0xB1, 0x99, 0xB4, 0x9F, 0xAA, 0x5F, 0x0A, 0x2E, 0xE2, 0x38,
        0xA6, 0xBC,
    ];
    const OPC: [u8; 16] = [
        0xCD, 0x63, 0xCB, 0x71, 0x95, 0x4A, 0x9F, 0x4E, 0x48, 0xA5, 0x99, 0x4B, 0x86, 0x5A,
        0xE9, 0x55,
    ];

    #[test]
    fn test_all_zero_inputs_give_all_zero_vector() {
        let vector = AuthVector::derive(&[0; 16], &[0; 16], &[0; 16]);
        assert_eq!(vector.res, [0; 8]);
        assert_eq!(vector.ck, [0; 16]);
        assert_eq!(vector.ik, [0; 16]);
        assert_eq!(vector.ak, [0; 6]);
        assert_eq!(vector.kc, [0; 8]);
    }

    #[test]
    fn test_res_packs_both_nibble_banks() {
        // T[i] = RAND[i] with zero keys; choose lanes so the packing of
        // low and high banks is visible.
        let mut rand = [0u8; 16];
        rand[0] = 0x0A;
        rand[8] = 0x05;
        let vector = AuthVector::derive(&rand, &[0; 16], &[0; 16]);
        assert_eq!(vector.res[0], 0x5A);
    }

    #[test]
    fn test_kc_folds_cipher_key() {
        let rand = [0x37u8; 16];
        let vector = AuthVector::derive(&rand, &KI, &OPC);
        for i in 0..8 {
            assert_eq!(vector.kc[i], vector.ck[i] ^ vector.ck[i + 8]);
        }
    }

    #[test]
    fn test_zero_rand_default_keys() {
        // With RAND all zero, CK reduces to Ki/OPc rotations alone.
        let vector = AuthVector::derive(&[0; 16], &KI, &OPC);
        assert_eq!(vector.ck[0], KI[3] ^ OPC[7]);
        assert_eq!(vector.ik[0], KI[11] ^ OPC[13]);
        assert_eq!(vector.ak[0], KI[5] ^ OPC[9]);
        assert_eq!(vector.res[0], (KI[0] ^ OPC[0]) & 0x0F | ((KI[8] ^ OPC[8]) & 0x0F) << 4);
    }

    #[test]
    fn test_wire_layout() {
        let vector = AuthVector::derive(&[0x11; 16], &KI, &OPC);
        let wire = vector.to_wire();
        assert_eq!(wire.len(), AUTH_RESPONSE_LEN);
        assert_eq!(&wire[..8], &vector.res);
        assert_eq!(&wire[8..24], &vector.ck);
        assert_eq!(&wire[24..40], &vector.ik);
        assert_eq!(&wire[40..46], &vector.ak);
        assert_eq!(&wire[46..], &vector.kc);
    }

    #[test]
    fn test_derive_keys_keystream() {
        let input = [0xFFu8; 4];
        let mut output = [0u8; 20];
        derive_keys(&input, &mut output);
        assert_eq!(output[0], 0xFF ^ XOR_MASK[0]);
        assert_eq!(output[16], 0xFF ^ XOR_MASK[0]);
        assert_eq!(output[17], 0xFF ^ XOR_MASK[1]);
    }

    #[test]
    fn test_verify_mac_roundtrip() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF];
        let mut mac = [0u8; 4];
        for (i, lane) in mac.iter_mut().enumerate() {
            for (j, &byte) in data.iter().enumerate() {
                *lane ^= byte ^ XOR_MASK[(i + j) % 16];
            }
        }
        assert!(verify_mac(&data, &mac));
        mac[1] ^= 0x01;
        assert!(!verify_mac(&data, &mac));
    }

    #[test]
    fn test_verify_mac_rejects_bad_lengths() {
        assert!(!verify_mac(&[1, 2, 3], &[]));
        assert!(!verify_mac(&[1, 2, 3], &[0u8; 9]));
    }
}
