//! Session context: state flags, derived keys and the current selection.
//!
//! The session is zeroed at power-on and at every ISO reset; it is never
//! persisted. Handlers are its only mutators.

use bitflags::bitflags;

use usim_auth::AuthVector;
use usim_fs::{FileId, FileKind, SessionRights};

bitflags! {
    /// Session state bits, reported verbatim by STATUS.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SessionFlags: u8 {
        /// A SELECT FILE has succeeded this session.
        const SELECTED = 0x01;
        /// The authentication engine has produced a vector this session.
        const AUTHENTICATED = 0x02;
        /// CHV1 has been verified this session.
        const PIN_VERIFIED = 0x04;
    }
}

/// Per-session context.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// State bitset.
    pub flags: SessionFlags,
    /// Last derived cipher key.
    pub ck: [u8; 16],
    /// Last derived integrity key.
    pub ik: [u8; 16],
    /// Last authentication response.
    pub res: [u8; 8],
    /// Last derived GSM key.
    pub kc: [u8; 8],
    /// Whether an authentication has succeeded.
    pub authenticated: bool,
}

impl Session {
    /// Fresh idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The rights view the file-system policy evaluates against.
    pub fn rights(&self) -> SessionRights {
        let mut rights = SessionRights::empty();
        if self.flags.contains(SessionFlags::PIN_VERIFIED) {
            rights |= SessionRights::PIN_VERIFIED;
        }
        if self.flags.contains(SessionFlags::AUTHENTICATED) {
            rights |= SessionRights::AUTHENTICATED;
        }
        rights
    }

    /// Install a freshly derived vector and mark the session authenticated.
    pub fn apply_auth(&mut self, vector: &AuthVector) {
        self.res = vector.res;
        self.ck = vector.ck;
        self.ik = vector.ik;
        self.kc = vector.kc;
        self.authenticated = true;
        self.flags.insert(SessionFlags::AUTHENTICATED);
    }

    /// The raw state byte as carried on the wire.
    pub fn state_byte(&self) -> u8 {
        self.flags.bits()
    }
}

/// The current selection, tracked by identifier so a reset never has to
/// fix up pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentFile {
    /// Selected file identifier.
    pub id: FileId,
    /// Its structural kind.
    pub kind: FileKind,
    /// Its declared size.
    pub size: u16,
}

impl CurrentFile {
    /// The selection every session starts from: the master file.
    pub fn master() -> Self {
        CurrentFile {
            id: FileId::MF,
            kind: FileKind::Mf,
            size: 0,
        }
    }
}

impl Default for CurrentFile {
    fn default() -> Self {
        Self::master()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.state_byte(), 0);
        assert!(!session.authenticated);
        assert!(session.rights().is_empty());
    }

    #[test]
    fn test_rights_mapping() {
        let mut session = Session::new();
        session.flags.insert(SessionFlags::PIN_VERIFIED);
        assert!(session.rights().contains(SessionRights::PIN_VERIFIED));
        assert!(!session.rights().contains(SessionRights::AUTHENTICATED));

        session.flags.insert(SessionFlags::AUTHENTICATED);
        assert!(session.rights().contains(SessionRights::AUTHENTICATED));
    }

    #[test]
    fn test_apply_auth_installs_keys() {
        let vector = usim_auth::AuthVector::derive(&[1; 16], &[2; 16], &[3; 16]);
        let mut session = Session::new();
        session.apply_auth(&vector);
        assert!(session.authenticated);
        assert_eq!(session.ck, vector.ck);
        assert_eq!(session.kc, vector.kc);
        assert!(session.flags.contains(SessionFlags::AUTHENTICATED));
        // SELECTED is untouched by authentication.
        assert!(!session.flags.contains(SessionFlags::SELECTED));
    }
}
