//! # On-card File System
//!
//! The static TS 31.102 catalogue, the access-condition policy and the
//! masking boundary for secret files.
//!
//! The catalogue never changes shape at runtime: files are looked up by
//! their 16-bit identifier and carry an optional bounded data region.
//! EF_KEY and EF_OPc are stored XOR-masked at rest; the only way to read
//! their plaintext is [`FileStore::read_into`], which unmasks into a
//! caller-supplied buffer so no plaintext copy lingers in card state.

#![no_std]

mod catalogue;
mod error;
mod file;
mod mask;
mod store;

pub use error::{FsError, FsResult};
pub use file::{AccessCondition, AccessKind, File, FileId, FileKind, SessionRights};
pub use mask::{xor_with_mask, XOR_MASK};
pub use store::{FileStore, REGION_CAP};
