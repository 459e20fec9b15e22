/*!
 * Drive Specifier Grammar
 *
 * `<native-root>:\` | `{<stable-id>}:\` | `<stable-id>:\` | `[<d|a|i|p><index>]:\`
 *
 * Schemes are matched in that order against one registry snapshot, and the
 * first scheme with a match wins. Comparison is case-insensitive throughout.
 */

use std::fmt;

use super::paths::strip_delimiter;
use crate::core::types::DriveType;
use crate::devices::DriveHandle;

/// Drive subset an ordinal selector indexes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrdinalKind {
    /// `d`: every drive
    Any,
    /// `a`: android phones and tablets
    Android,
    /// `i`: iOS devices
    Ios,
    /// `p`: every portable device
    Portable,
}

impl OrdinalKind {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'd' => Some(Self::Any),
            'a' => Some(Self::Android),
            'i' => Some(Self::Ios),
            'p' => Some(Self::Portable),
            _ => None,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Self::Any => 'd',
            Self::Android => 'a',
            Self::Ios => 'i',
            Self::Portable => 'p',
        }
    }

    #[inline]
    pub const fn admits(self, drive_type: DriveType) -> bool {
        match self {
            Self::Any => true,
            Self::Android => drive_type.is_android(),
            Self::Ios => drive_type.is_ios(),
            Self::Portable => drive_type.is_portable(),
        }
    }
}

/// `[<kind><index>]` selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ordinal {
    pub kind: OrdinalKind,
    pub index: usize,
}

impl Ordinal {
    /// Parse `[a0]`, `[a0]:` or `[a0]:\`
    pub fn parse(specifier: &str) -> Option<Self> {
        let inner = strip_delimiter(specifier.trim())
            .strip_prefix('[')?
            .strip_suffix(']')?;

        let mut chars = inner.chars();
        let kind = OrdinalKind::from_letter(chars.next()?)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index = digits.parse().ok()?;
        Some(Self { kind, index })
    }

    /// Pick the selected drive from a registry-order snapshot
    pub fn select<'a>(&self, drives: &'a [DriveHandle]) -> Option<&'a DriveHandle> {
        drives
            .iter()
            .filter(|d| self.kind.admits(d.drive_type()))
            .nth(self.index)
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}{}]:\\", self.kind.letter(), self.index)
    }
}

/// Inner id of a `{id}` specifier
pub fn braced_id(specifier: &str) -> Option<&str> {
    strip_delimiter(specifier.trim())
        .strip_prefix('{')?
        .strip_suffix('}')
        .filter(|id| !id.is_empty())
}

/// Resolve a specifier against a registry-order snapshot
///
/// Drives without a stable id (unknown or ambiguous hardware) never match
/// the id schemes.
pub fn find_drive<'a>(drives: &'a [DriveHandle], specifier: &str) -> Option<&'a DriveHandle> {
    let wanted = strip_delimiter(specifier.trim());
    if wanted.is_empty() {
        return None;
    }

    if let Some(drive) = drives
        .iter()
        .find(|d| strip_delimiter(&d.root_name()).eq_ignore_ascii_case(wanted))
    {
        return Some(drive);
    }

    if let Some(id) = braced_id(wanted) {
        if let Some(drive) = drives.iter().find(|d| d.has_stable_id(id)) {
            return Some(drive);
        }
    }

    if let Some(drive) = drives.iter().find(|d| d.has_stable_id(wanted)) {
        return Some(drive);
    }

    Ordinal::parse(wanted).and_then(|ordinal| ordinal.select(drives))
}
