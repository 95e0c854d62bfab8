//! File entries and the access-condition policy.

use core::fmt;

use bitflags::bitflags;

use crate::error::{FsError, FsResult};
use crate::store::REGION_CAP;

/// A 16-bit file identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FileId(pub u16);

impl FileId {
    /// Master file, the root of the tree. Always present.
    pub const MF: Self = Self(0x3F00);
    /// DF_Telecom.
    pub const DF_TELECOM: Self = Self(0x7F10);
    /// DF_GSM.
    pub const DF_GSM: Self = Self(0x7F20);
    /// EF_IMSI, the subscriber identity.
    pub const EF_IMSI: Self = Self(0x6F07);
    /// EF_KEY, the long-term key Ki. Stored masked, never readable.
    pub const EF_KEY: Self = Self(0x6F08);
    /// EF_OPc, the operator constant. Stored masked, never readable.
    pub const EF_OPC: Self = Self(0x6F09);
    /// EF_PLMNwAcT, preferred networks (declared but unbacked).
    pub const EF_PLMN: Self = Self(0x6F60);
    /// EF_ACC, access control class.
    pub const EF_ACC: Self = Self(0x6F78);
    /// EF_LOCI, location information.
    pub const EF_LOCI: Self = Self(0x6F7E);
    /// EF_AD, administrative data.
    pub const EF_AD: Self = Self(0x6FAD);
    /// EF_PHASE, phase identification.
    pub const EF_PHASE: Self = Self(0x6FAE);

    /// Build from the two identifier bytes of a SELECT data field.
    #[inline]
    pub const fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    /// The identifier bytes in wire order.
    #[inline]
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({:04X})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

/// Structural kind of a catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Master file (root directory).
    Mf,
    /// Dedicated file (directory).
    Df,
    /// Elementary file (data leaf).
    Ef,
}

impl FileKind {
    /// The file-descriptor byte used in the FCP template.
    #[inline]
    pub const fn fcp_descriptor(self) -> u8 {
        match self {
            FileKind::Ef => 0x21,
            FileKind::Mf | FileKind::Df => 0x38,
        }
    }

    /// Whether the entry is a data leaf.
    #[inline]
    pub const fn is_ef(self) -> bool {
        matches!(self, FileKind::Ef)
    }
}

/// The single access condition attached to each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCondition {
    /// Permitted unconditionally.
    Always,
    /// Denied unconditionally.
    Never,
    /// Requires a verified CHV1.
    Chv1,
    /// Requires administrative authentication.
    Adm,
}

/// What an operation wants to do with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// Selection by identifier; reveals only FCP metadata.
    Select,
    /// Read the data region.
    Read,
    /// Write the data region.
    Update,
}

bitflags! {
    /// The session rights the policy evaluates conditions against.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SessionRights: u8 {
        /// CHV1 has been verified this session.
        const PIN_VERIFIED = 1 << 0;
        /// The administrative authentication succeeded this session.
        const AUTHENTICATED = 1 << 1;
    }
}

/// Bounded mutable byte region backing an elementary file.
#[derive(Clone)]
pub(crate) struct Region {
    pub(crate) bytes: [u8; REGION_CAP],
    /// Count of bytes written so far (grows monotonically up to the
    /// declared size; reads are served from the declared window).
    pub(crate) valid: u16,
}

/// One catalogue entry.
pub struct File {
    pub(crate) id: FileId,
    pub(crate) kind: FileKind,
    pub(crate) size: u16,
    pub(crate) access: AccessCondition,
    pub(crate) region: Option<Region>,
    pub(crate) name: &'static str,
}

impl File {
    /// File identifier.
    #[inline]
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Structural kind.
    #[inline]
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Declared size in bytes (zero for directories).
    #[inline]
    pub fn size(&self) -> u16 {
        self.size
    }

    /// The access condition.
    #[inline]
    pub fn access(&self) -> AccessCondition {
        self.access
    }

    /// Human-readable name, for log lines only.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared data window, or `None` for unbacked entries. Secret
    /// files yield their *masked* bytes here; use
    /// [`crate::FileStore::read_into`] for plaintext.
    pub fn data(&self) -> Option<&[u8]> {
        self.region
            .as_ref()
            .map(|region| &region.bytes[..self.size as usize])
    }

    /// Count of bytes considered written.
    pub fn valid_len(&self) -> u16 {
        self.region.as_ref().map_or(0, |region| region.valid)
    }

    /// Copy `data` into the region at `offset` and grow the valid count.
    /// The caller has already validated `offset + data.len()` against the
    /// declared size; fails with [`FsError::Unbacked`] when the file has
    /// no region.
    pub fn write_at(&mut self, offset: usize, data: &[u8]) -> FsResult<()> {
        debug_assert!(offset + data.len() <= self.size as usize);
        let Some(region) = self.region.as_mut() else {
            return Err(FsError::Unbacked);
        };
        region.bytes[offset..offset + data.len()].copy_from_slice(data);
        let end = (offset + data.len()) as u16;
        if end > region.valid {
            region.valid = end;
        }
        Ok(())
    }

    /// Evaluate the access policy for this file.
    ///
    /// SELECT is always permitted; READ and UPDATE are decided by the
    /// file's single condition code against the session rights.
    pub fn permits(&self, kind: AccessKind, rights: SessionRights) -> bool {
        if matches!(kind, AccessKind::Select) {
            return true;
        }
        match self.access {
            AccessCondition::Always => true,
            AccessCondition::Never => false,
            AccessCondition::Chv1 => rights.contains(SessionRights::PIN_VERIFIED),
            AccessCondition::Adm => rights.contains(SessionRights::AUTHENTICATED),
        }
    }
}
