//! Archive input for NFC-e batches
//!
//! An NFC-e batch arrives as a single ZIP archive holding one XML document per
//! member. This crate opens the archive in memory and hands back the XML
//! members in archive order; everything else in the archive is ignored.
//!
//! # Usage
//!
//! ```no_run
//! use nfce_archive::extract_xml_members_from_path;
//! use std::path::Path;
//!
//! let members = extract_xml_members_from_path(Path::new("notas.zip")).unwrap();
//! for member in members {
//!     match &member.contents {
//!         Ok(contents) => println!("{} ({} bytes)", member.name, contents.len()),
//!         Err(skip) => println!("{}: {skip}", member.name),
//!     }
//! }
//! ```

pub mod error;
pub mod zip;

/// Maximum uncompressed size for a single archive member (100 MB).
///
/// Members exceeding this limit are listed without their contents, to prevent
/// memory exhaustion from zip bombs.
pub const MAX_MEMBER_SIZE: u64 = 100_000_000;

pub use error::{ArchiveError, Result};
pub use crate::zip::{
    extract_xml_members, extract_xml_members_from_path, extract_xml_members_with_limit,
    is_xml_member, ArchiveMember, MemberSkip,
};
