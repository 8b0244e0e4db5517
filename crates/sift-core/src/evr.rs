//! RPM version ordering.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::Serialize;

use crate::{error::SiftError, SiftResult};

fn is_separator(b: u8) -> bool {
    !b.is_ascii_alphanumeric() && b != b'~' && b != b'^'
}

/// Compares two version (or release) strings the way rpm does.
///
/// Strings are split into alternating runs of digits and letters; anything
/// else separates runs. Digit runs compare numerically, and a digit run
/// beats a letter run. `~` sorts before everything, including the end of
/// the string. `^` sorts after the end of the string but before any
/// further run.
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    loop {
        while i < a.len() && is_separator(a[i]) {
            i += 1;
        }
        while j < b.len() && is_separator(b[j]) {
            j += 1;
        }

        let (ca, cb) = (a.get(i).copied(), b.get(j).copied());

        if ca == Some(b'~') || cb == Some(b'~') {
            if ca != Some(b'~') {
                return Ordering::Greater;
            }
            if cb != Some(b'~') {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }

        if ca == Some(b'^') || cb == Some(b'^') {
            match (ca, cb) {
                (None, _) => return Ordering::Less,
                (_, None) => return Ordering::Greater,
                (Some(x), _) if x != b'^' => return Ordering::Greater,
                (_, Some(y)) if y != b'^' => return Ordering::Less,
                _ => {}
            }
            i += 1;
            j += 1;
            continue;
        }

        if i >= a.len() || j >= b.len() {
            break;
        }

        let numeric = a[i].is_ascii_digit();
        let in_run = |c: u8| {
            if numeric {
                c.is_ascii_digit()
            } else {
                c.is_ascii_alphabetic()
            }
        };

        let run_a_len = a[i..].iter().take_while(|&&c| in_run(c)).count();
        let run_b_len = b[j..].iter().take_while(|&&c| in_run(c)).count();
        let run_a = &a[i..i + run_a_len];
        let run_b = &b[j..j + run_b_len];
        i += run_a_len;
        j += run_b_len;

        if run_b.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let order = if numeric {
            let run_a = trim_leading_zeros(run_a);
            let run_b = trim_leading_zeros(run_b);
            run_a.len().cmp(&run_b.len()).then_with(|| run_a.cmp(run_b))
        } else {
            run_a.cmp(run_b)
        };

        if order != Ordering::Equal {
            return order;
        }
    }

    match (i >= a.len(), j >= b.len()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        _ => Ordering::Greater,
    }
}

fn trim_leading_zeros(run: &[u8]) -> &[u8] {
    let zeros = run.iter().take_while(|&&c| c == b'0').count();
    &run[zeros..]
}

/// Epoch, version and release of a package.
///
/// An empty `release` means the release is unspecified. Ordering compares
/// epoch numerically, then version and release with [`rpmvercmp`]; an
/// unspecified release sorts before any specified one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Evr {
    pub epoch: u64,
    pub version: String,
    pub release: String,
}

impl Evr {
    pub fn new(epoch: u64, version: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            epoch,
            version: version.into(),
            release: release.into(),
        }
    }

    /// Parses `[epoch:]version[-release]`.
    pub fn parse(s: &str) -> SiftResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(SiftError::malformed(s, "expected [epoch:]version[-release]"));
        }

        let (epoch, rest) = match trimmed.split_once(':') {
            Some((epoch, rest)) => {
                let epoch = epoch
                    .parse::<u64>()
                    .map_err(|_| SiftError::malformed(s, "epoch must be a non-negative integer"))?;
                (epoch, rest)
            }
            None => (0, trimmed),
        };

        let (version, release) = rest.rsplit_once('-').unwrap_or((rest, ""));
        if version.is_empty() || version.contains(':') {
            return Err(SiftError::malformed(s, "missing or invalid version"));
        }
        if rest.ends_with('-') {
            return Err(SiftError::malformed(s, "empty release after '-'"));
        }

        Ok(Self::new(epoch, version, release))
    }

    pub fn has_release(&self) -> bool {
        !self.release.is_empty()
    }

    /// Comparison used for dependency matching: when either side leaves the
    /// release unspecified, releases are not compared.
    pub fn cmp_release_tolerant(&self, other: &Evr) -> Ordering {
        let order = self
            .epoch
            .cmp(&other.epoch)
            .then_with(|| rpmvercmp(&self.version, &other.version));
        if !self.has_release() || !other.has_release() {
            return order;
        }
        order.then_with(|| rpmvercmp(&self.release, &other.release))
    }
}

impl Ord for Evr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| rpmvercmp(&self.version, &other.version))
            .then_with(|| {
                match (self.has_release(), other.has_release()) {
                    (true, true) => rpmvercmp(&self.release, &other.release),
                    (false, true) => Ordering::Less,
                    (true, false) => Ordering::Greater,
                    (false, false) => Ordering::Equal,
                }
            })
    }
}

impl PartialOrd for Evr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Evr {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Evr {}

impl FromStr for Evr {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Formats as `version-release`, prefixed with `epoch:` when the epoch is not zero.
impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.version)?;
        if self.has_release() {
            write!(f, "-{}", self.release)?;
        }
        Ok(())
    }
}
