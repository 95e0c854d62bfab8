//! The file store: lookup views and the secret-file boundary.

use log::debug;

use crate::catalogue::{self, CATALOGUE_LEN};
use crate::error::{FsError, FsResult};
use crate::file::{File, FileId};
use crate::mask::xor_with_mask;

/// Capacity of a backed data region. The largest backed file (EF_KEY and
/// EF_OPc) declares 16 bytes.
pub const REGION_CAP: usize = 16;

/// The card's file store. Rebuilt with seed contents whenever the card is
/// reinitialized (power-on or ISO reset).
pub struct FileStore {
    files: [File; CATALOGUE_LEN],
}

impl FileStore {
    /// Build the catalogue with seed contents, secrets masked in place.
    pub fn new() -> Self {
        let store = FileStore {
            files: catalogue::build(),
        };
        debug_assert!(store.ids_unique());
        debug_assert!(store.find(FileId::MF).is_some());
        store
    }

    fn ids_unique(&self) -> bool {
        for (i, file) in self.files.iter().enumerate() {
            if self.files[i + 1..].iter().any(|other| other.id() == file.id()) {
                return false;
            }
        }
        true
    }

    /// Immutable lookup by identifier (linear, the table is small).
    pub fn find(&self, id: FileId) -> Option<&File> {
        self.files.iter().find(|file| file.id() == id)
    }

    /// Mutable lookup; only handlers with write intent use this view.
    pub fn find_mut(&mut self, id: FileId) -> Option<&mut File> {
        self.files.iter_mut().find(|file| file.id() == id)
    }

    /// Whether the identifier names one of the masked secret files.
    #[inline]
    pub fn is_secret(id: FileId) -> bool {
        id == FileId::EF_KEY || id == FileId::EF_OPC
    }

    /// Read a file's declared data window.
    ///
    /// Secret files are copied into `scratch` and unmasked there; all
    /// other files are returned by reference. `None` when the file is
    /// absent or unbacked.
    pub fn read_into<'a>(
        &'a self,
        id: FileId,
        scratch: &'a mut [u8; REGION_CAP],
    ) -> Option<&'a [u8]> {
        let file = self.find(id)?;
        let data = file.data()?;
        if Self::is_secret(id) {
            scratch[..data.len()].copy_from_slice(data);
            xor_with_mask(&mut scratch[..data.len()]);
            Some(&scratch[..data.len()])
        } else {
            Some(data)
        }
    }

    /// Store plaintext into a secret file, re-masking before it lands.
    pub fn write_secret(&mut self, id: FileId, plain: &[u8; REGION_CAP]) -> FsResult<()> {
        debug_assert!(Self::is_secret(id));
        let file = self.find_mut(id).ok_or(FsError::NotFound)?;
        let mut masked = *plain;
        xor_with_mask(&mut masked);
        file.write_at(0, &masked)?;
        debug!("secret file {} reprovisioned", file.name());
        Ok(())
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{AccessCondition, FileKind};

    const KI_SEED: [u8; 16] = [
        0x46, 0x5B, 0x5C, 0xE8, 0xB1, 0x99, 0xB4, 0x9F, 0xAA, 0x5F, 0x0A, 0x2E, 0xE2, 0x38,
        0xA6, 0xBC,
    ];

    #[test]
    fn test_master_file_present() {
        let store = FileStore::new();
        let mf = store.find(FileId::MF).unwrap();
        assert_eq!(mf.kind(), FileKind::Mf);
        assert_eq!(mf.size(), 0);
    }

    #[test]
    fn test_lookup_miss() {
        let store = FileStore::new();
        assert!(store.find(FileId(0x2F00)).is_none());
    }

    #[test]
    fn test_secrets_masked_at_rest() {
        let store = FileStore::new();
        let key = store.find(FileId::EF_KEY).unwrap();
        assert_eq!(key.access(), AccessCondition::Never);
        // The raw window must not expose the plaintext seed.
        assert_ne!(key.data().unwrap(), &KI_SEED);
    }

    #[test]
    fn test_read_into_unmasks_secrets() {
        let store = FileStore::new();
        let mut scratch = [0u8; REGION_CAP];
        let plain = store.read_into(FileId::EF_KEY, &mut scratch).unwrap();
        assert_eq!(plain, &KI_SEED);
    }

    #[test]
    fn test_read_into_plain_files_by_reference() {
        let store = FileStore::new();
        let mut scratch = [0xEEu8; REGION_CAP];
        let ad = store.read_into(FileId::EF_AD, &mut scratch).unwrap();
        assert_eq!(ad, &[0x00, 0x00]);
        // Scratch untouched: the data came straight from the store.
        assert_eq!(scratch, [0xEE; REGION_CAP]);
    }

    #[test]
    fn test_unbacked_file_reads_none() {
        let store = FileStore::new();
        let mut scratch = [0u8; REGION_CAP];
        assert!(store.read_into(FileId::EF_PLMN, &mut scratch).is_none());
    }

    #[test]
    fn test_write_secret_roundtrip() {
        let mut store = FileStore::new();
        let fresh = [0xA5u8; REGION_CAP];
        assert_eq!(store.write_secret(FileId::EF_KEY, &fresh), Ok(()));

        // Masked at rest, plaintext through the helper.
        let at_rest = store.find(FileId::EF_KEY).unwrap().data().unwrap();
        assert_ne!(at_rest, &fresh);
        let mut scratch = [0u8; REGION_CAP];
        assert_eq!(
            store.read_into(FileId::EF_KEY, &mut scratch).unwrap(),
            &fresh
        );
    }
}
