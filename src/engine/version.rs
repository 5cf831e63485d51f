use std::{
    cmp::Ordering,
    fmt,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VerupError};

/// Optional delimiter, the `v` marker, then the digits.
///
/// Covers `name.v003.ext`, `name_v003.ext`, `name-v003.ext` and the
/// bare `namev003.ext`, in any marker case.
static VERSION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([._-]?)(v)([0-9]+)").expect("version token pattern must compile")
});

/// Delimiter written immediately before the `v` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    None,
    Dot,
    Underscore,
    Dash,
}

impl Separator {
    fn from_capture(s: &str) -> Self {
        match s {
            "." => Separator::Dot,
            "_" => Separator::Underscore,
            "-" => Separator::Dash,
            _ => Separator::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::None => "",
            Separator::Dot => ".",
            Separator::Underscore => "_",
            Separator::Dash => "-",
        }
    }
}

/// A version number of any size, kept as decimal digits without leading
/// zeros. Incrementing works on the digits, so it never overflows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct VersionNumber(String);

impl VersionNumber {
    /// Reads a non-empty run of ASCII digits. Leading zeros are dropped.
    pub fn from_digits(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = digits.trim_start_matches('0');
        let canonical = if trimmed.is_empty() { "0" } else { trimmed };
        Some(Self(canonical.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn digit_count(&self) -> usize {
        self.0.len()
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// `self + 1`, carrying through trailing nines (`999` → `1000`).
    pub fn incremented(&self) -> Self {
        let mut digits = self.0.as_bytes().to_vec();
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
        Self(digits.into_iter().map(char::from).collect())
    }
}

impl From<u64> for VersionNumber {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl TryFrom<String> for VersionNumber {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Self::from_digits(&s).ok_or_else(|| format!("`{}` is not a version number", s))
    }
}

impl From<VersionNumber> for String {
    fn from(n: VersionNumber) -> Self {
        n.0
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        // No leading zeros, so more digits means a larger number
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// A path split around its version token.
///
/// Rendering a freshly parsed value reproduces the input byte for byte:
/// the marker keeps its case and `width` keeps the original zero padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedPath {
    pub prefix: String,
    pub separator: Separator,
    pub marker: char,
    pub number: VersionNumber,
    pub width: usize,
    pub suffix: String,
}

impl VersionedPath {
    /// Finds the version token nearest the end of the file name.
    ///
    /// Only the last component (after the final `/` or `\`) is scanned.
    pub fn parse(path: &str) -> Option<Self> {
        let name_start = path.rfind(['/', '\\']).map_or(0, |idx| idx + 1);
        let file_name = &path[name_start..];

        let caps = VERSION_TOKEN.captures_iter(file_name).last()?;

        let whole = caps.get(0)?;
        let digits = caps.get(3)?;
        let number = VersionNumber::from_digits(digits.as_str())?;

        Some(Self {
            prefix: path[..name_start + whole.start()].to_string(),
            separator: Separator::from_capture(&caps[1]),
            marker: caps[2].chars().next()?,
            number,
            width: digits.as_str().len(),
            suffix: file_name[digits.end()..].to_string(),
        })
    }

    /// Parses a `Path`, rejecting paths that are not valid UTF-8.
    pub fn from_path(path: &Path) -> Result<Option<Self>> {
        let s = path
            .to_str()
            .ok_or_else(|| VerupError::InvalidPath(path.to_path_buf()))?;
        Ok(Self::parse(s))
    }

    /// Zero-padded digits, e.g. `003`.
    pub fn digits(&self) -> String {
        format!("{:0>width$}", self.number.as_str(), width = self.width)
    }

    /// The whole token without the separator, e.g. `v003`.
    pub fn token(&self) -> String {
        format!("{}{}", self.marker, self.digits())
    }

    pub fn render(&self) -> String {
        format!(
            "{}{}{}{}",
            self.prefix,
            self.separator.as_str(),
            self.token(),
            self.suffix
        )
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(self.render())
    }

    /// Next version with the same layout.
    ///
    /// Padding is kept, and widened when the number needs more digits.
    pub fn bumped(&self) -> Self {
        let number = self.number.incremented();
        let width = self.width.max(number.digit_count());
        Self {
            number,
            width,
            ..self.clone()
        }
    }

    /// True when `other` is another version of the same file.
    pub fn same_family(&self, other: &VersionedPath) -> bool {
        self.prefix == other.prefix
            && self.separator == other.separator
            && self.suffix == other.suffix
            && self.marker.eq_ignore_ascii_case(&other.marker)
    }
}

impl fmt::Display for VersionedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Computes the next version path without touching the filesystem.
///
/// Returns the candidate path and its version number. Fails with
/// [`VerupError::NoVersionToken`] when `path` carries no version.
pub fn next_path(path: &Path) -> Result<(PathBuf, VersionNumber)> {
    let parsed = VersionedPath::from_path(path)?
        .ok_or_else(|| VerupError::NoVersionToken(path.to_path_buf()))?;
    let next = parsed.bumped();

    Ok((next.to_path_buf(), next.number))
}

/// Version number embedded in `path`, if any.
pub fn version_number(path: &Path) -> Option<VersionNumber> {
    VersionedPath::from_path(path).ok().flatten().map(|v| v.number)
}
