//! ZIP member extraction
//!
//! Reads an in-memory ZIP archive and returns the members that can hold an
//! NFC-e XML document, in archive order.

use crate::error::{ArchiveError, Result};
use crate::MAX_MEMBER_SIZE;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

/// Why an XML member was listed without its contents
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberSkip {
    /// Uncompressed size is over the extraction limit
    #[error("member is {size} bytes, over the {limit} bytes limit")]
    TooLarge {
        /// Uncompressed size declared in the archive
        size: u64,
        /// Limit in force during extraction
        limit: u64,
    },
}

/// An XML member of the archive
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveMember {
    /// Member name as stored in the archive (may include directories)
    pub name: String,
    /// Uncompressed contents, or the reason they were not read
    pub contents: std::result::Result<Vec<u8>, MemberSkip>,
}

/// Whether an archive member name denotes an XML document
///
/// The check is on the `.xml` suffix only and ignores ASCII case.
#[inline]
#[must_use]
pub fn is_xml_member(name: &str) -> bool {
    name.len() >= 4
        && name
            .get(name.len() - 4..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".xml"))
}

/// Extract every XML member of a ZIP archive held in memory
///
/// Uses [`MAX_MEMBER_SIZE`] as the per-member limit; see
/// [`extract_xml_members_with_limit`].
///
/// # Errors
///
/// See [`extract_xml_members_with_limit`].
#[must_use = "this function returns extracted members that should be processed"]
pub fn extract_xml_members(bytes: &[u8]) -> Result<Vec<ArchiveMember>> {
    extract_xml_members_with_limit(bytes, MAX_MEMBER_SIZE)
}

/// Extract every XML member of a ZIP archive held in memory
///
/// Directories and members without an `.xml` suffix are ignored, encrypted or
/// not. XML members larger than `limit` are listed with
/// [`MemberSkip::TooLarge`] instead of their contents.
///
/// # Errors
///
/// Returns `ArchiveError` if:
/// - the bytes are not a valid ZIP archive
/// - an XML member is password-protected
/// - a member cannot be decompressed
/// - the archive holds no XML member
#[must_use = "this function returns extracted members that should be processed"]
pub fn extract_xml_members_with_limit(bytes: &[u8], limit: u64) -> Result<Vec<ArchiveMember>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut members = Vec::new();

    for i in 0..archive.len() {
        // Raw access reads the header only, so encrypted entries do not fail here
        let (name, is_dir, encrypted, size) = {
            let entry = archive.by_index_raw(i)?;
            (
                entry.name().to_string(),
                entry.is_dir(),
                entry.encrypted(),
                entry.size(),
            )
        };

        if is_dir {
            continue;
        }

        if !is_xml_member(&name) {
            debug!("Ignoring non-XML member: {name}");
            continue;
        }

        if encrypted {
            return Err(ArchiveError::PasswordProtected(name));
        }

        if size > limit {
            warn!("Skipping large member: {name} ({size} bytes exceeds {limit} bytes limit)");
            members.push(ArchiveMember {
                name,
                contents: Err(MemberSkip::TooLarge { size, limit }),
            });
            continue;
        }

        let mut entry = archive.by_index(i)?;
        let mut contents = Vec::with_capacity(usize::try_from(size).unwrap_or_default());
        entry.read_to_end(&mut contents)?;

        members.push(ArchiveMember {
            name,
            contents: Ok(contents),
        });
    }

    if members.is_empty() {
        return Err(ArchiveError::NoXmlMembers);
    }

    debug!("Extracted {} XML members", members.len());
    Ok(members)
}

/// Read a ZIP archive from disk and extract its XML members
///
/// # Errors
///
/// Returns `ArchiveError::Io` if the file cannot be read, otherwise the same
/// errors as [`extract_xml_members`].
#[must_use = "this function returns extracted members that should be processed"]
pub fn extract_xml_members_from_path(path: &Path) -> Result<Vec<ArchiveMember>> {
    let bytes = fs::read(path)?;
    extract_xml_members(&bytes)
}
