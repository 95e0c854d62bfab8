//! # USIM Card Core
//!
//! The card itself: subscriber and session state, the command handlers,
//! the CLA/INS dispatcher and the runtime that ties the APDU surface to
//! the T=0 transport.
//!
//! All mutable card state lives in one owned [`Card`] value passed by
//! reference into handlers; there are no module-level singletons. The
//! current file is tracked by identifier and re-looked-up on each access,
//! which is what makes reset trivial: a reset simply rebuilds the card.

#![no_std]

mod card;
mod dispatch;
mod handlers;
mod runtime;
mod session;
mod subscriber;

#[cfg(feature = "config-apdu")]
mod config;
#[cfg(feature = "usat")]
mod usat;

pub use card::Card;
pub use runtime::CardRuntime;
pub use session::{CurrentFile, Session, SessionFlags};
pub use subscriber::Subscriber;

/// Card version, reported by the STATUS command.
pub const CARD_VERSION: CardVersion = CardVersion { major: 2, minor: 0 };

/// Version pair baked into the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
}
