//! The static file catalogue and its seed contents (3GPP TS 31.102).

use crate::file::{AccessCondition, File, FileId, FileKind, Region};
use crate::mask::xor_with_mask;
use crate::store::REGION_CAP;

/// Number of catalogue entries.
pub(crate) const CATALOGUE_LEN: usize = 11;

const IMSI_SEED: [u8; 9] = [0x08, 0x09, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
const KI_SEED: [u8; 16] = [
    0x46, 0x5B, 0x5C, 0xE8, 0xB1, 0x99, 0xB4, 0x9F, 0xAA, 0x5F, 0x0A, 0x2E, 0xE2, 0x38, 0xA6,
    0xBC,
];
const OPC_SEED: [u8; 16] = [
    0xCD, 0x63, 0xCB, 0x71, 0x95, 0x4A, 0x9F, 0x4E, 0x48, 0xA5, 0x99, 0x4B, 0x86, 0x5A, 0xE9,
    0x55,
];
const ACC_SEED: [u8; 2] = [0x00, 0x01];
const LOCI_SEED: [u8; 11] = [
    0x07, 0x25, 0x43, 0x10, 0x00, 0x62, 0xF5, 0x35, 0x01, 0x00, 0x00,
];
const AD_SEED: [u8; 2] = [0x00, 0x00];
const PHASE_SEED: [u8; 1] = [0x03];

fn region_from(seed: &[u8], masked: bool) -> Region {
    debug_assert!(seed.len() <= REGION_CAP);
    let mut bytes = [0u8; REGION_CAP];
    bytes[..seed.len()].copy_from_slice(seed);
    if masked {
        xor_with_mask(&mut bytes[..seed.len()]);
    }
    Region {
        bytes,
        valid: seed.len() as u16,
    }
}

fn directory(id: FileId, kind: FileKind, name: &'static str) -> File {
    File {
        id,
        kind,
        size: 0,
        access: AccessCondition::Always,
        region: None,
        name,
    }
}

fn elementary(
    id: FileId,
    size: u16,
    access: AccessCondition,
    seed: Option<&[u8]>,
    masked: bool,
    name: &'static str,
) -> File {
    File {
        id,
        kind: FileKind::Ef,
        size,
        access,
        region: seed.map(|seed| region_from(seed, masked)),
        name,
    }
}

/// Build the catalogue in table order. Secret files come out of here
/// already masked; their plaintext seeds never sit in a `File`.
pub(crate) fn build() -> [File; CATALOGUE_LEN] {
    [
        directory(FileId::MF, FileKind::Mf, "MF"),
        directory(FileId::DF_TELECOM, FileKind::Df, "DF_TELECOM"),
        directory(FileId::DF_GSM, FileKind::Df, "DF_GSM"),
        elementary(
            FileId::EF_IMSI,
            9,
            AccessCondition::Chv1,
            Some(&IMSI_SEED),
            false,
            "EF_IMSI",
        ),
        elementary(
            FileId::EF_KEY,
            16,
            AccessCondition::Never,
            Some(&KI_SEED),
            true,
            "EF_KEY",
        ),
        elementary(
            FileId::EF_OPC,
            16,
            AccessCondition::Never,
            Some(&OPC_SEED),
            true,
            "EF_OPC",
        ),
        elementary(FileId::EF_PLMN, 22, AccessCondition::Always, None, false, "EF_PLMN"),
        elementary(
            FileId::EF_ACC,
            2,
            AccessCondition::Always,
            Some(&ACC_SEED),
            false,
            "EF_ACC",
        ),
        elementary(
            FileId::EF_LOCI,
            11,
            AccessCondition::Chv1,
            Some(&LOCI_SEED),
            false,
            "EF_LOCI",
        ),
        elementary(
            FileId::EF_AD,
            2,
            AccessCondition::Always,
            Some(&AD_SEED),
            false,
            "EF_AD",
        ),
        elementary(
            FileId::EF_PHASE,
            1,
            AccessCondition::Always,
            Some(&PHASE_SEED),
            false,
            "EF_PHASE",
        ),
    ]
}
