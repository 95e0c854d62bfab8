//! The card value: all mutable state plus the APDU entry point.

use log::info;

use usim_apdu::{Command, Response, StatusWord, MAX_RESPONSE_LEN};
use usim_fs::FileStore;

use crate::session::{CurrentFile, Session};
use crate::subscriber::Subscriber;

/// The whole card. One owned value; every handler mutates it through a
/// borrowed reference.
pub struct Card {
    pub(crate) session: Session,
    pub(crate) subscriber: Subscriber,
    pub(crate) current_file: CurrentFile,
    pub(crate) files: FileStore,
}

impl Card {
    /// Build a factory-fresh card: default subscriber, idle session, the
    /// master file selected and the catalogue re-seeded (secrets masked).
    ///
    /// This is also the ISO-reset path: the runtime rebuilds the card
    /// from scratch whenever the transport reports a reset.
    pub fn new() -> Self {
        let card = Card {
            session: Session::new(),
            subscriber: Subscriber::new(),
            current_file: CurrentFile::master(),
            files: FileStore::new(),
        };
        info!("USIM application initialized");
        card
    }

    /// Soft reset: clear the session, restore the retry counters and
    /// re-select the master file, leaving file contents and PIN alone.
    pub fn reset_session(&mut self) {
        self.session = Session::new();
        self.subscriber.pin1_retries = 3;
        self.subscriber.puk1_retries = 10;
        self.current_file = CurrentFile::master();
    }

    /// Process one raw command and serialize the response (data followed
    /// by SW1 SW2) into `wire`, returning the valid prefix.
    pub fn process<'a>(
        &mut self,
        raw: &[u8],
        wire: &'a mut [u8; MAX_RESPONSE_LEN],
    ) -> &'a [u8] {
        let mut resp = Response::new();

        let outcome = match Command::parse(raw) {
            Ok(cmd) => self.dispatch(&cmd, &mut resp),
            Err(sw) => Err(sw),
        };
        resp.sw = match outcome {
            Ok(()) => StatusWord::OK,
            Err(sw) => sw,
        };

        resp.serialize(wire)
    }
}

impl Default for Card {
    fn default() -> Self {
        Self::new()
    }
}
