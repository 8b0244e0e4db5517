//! Splitting package specs into name, epoch, version, release and arch.

use std::fmt;

use serde::Serialize;

use crate::{error::SiftError, SiftResult};

/// Shape a spec string is read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    /// `name-[epoch:]version-release.arch`
    Nevra,
    /// `name-[epoch:]version-release`
    Nevr,
    /// `name-[epoch:]version`
    Nev,
    /// `name.arch`
    Na,
    /// `name`
    Name,
}

/// Forms tried when resolving a package spec, in order.
pub const DEFAULT_PKG_SPEC_FORMS: [Form; 5] =
    [Form::Nevra, Form::Na, Form::Name, Form::Nevr, Form::Nev];

/// Parsed spec. Empty fields were absent from the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Nevra {
    pub name: String,
    pub epoch: String,
    pub version: String,
    pub release: String,
    pub arch: String,
}

#[derive(Default)]
struct Delimiters {
    before_last_dash: Option<usize>,
    last_dash: Option<usize>,
    colon: Option<usize>,
    last_dot: Option<usize>,
}

impl Delimiters {
    fn scan(spec: &str) -> SiftResult<Self> {
        let mut delims = Self::default();
        let mut in_range = false;

        for (i, c) in spec.bytes().enumerate() {
            if in_range {
                if c == b']' {
                    in_range = false;
                }
                continue;
            }
            match c {
                b'[' => in_range = true,
                b'-' => {
                    delims.before_last_dash = delims.last_dash;
                    delims.last_dash = Some(i);
                }
                b'.' => delims.last_dot = Some(i),
                b':' => {
                    if delims.colon.is_some() {
                        return Err(SiftError::malformed(spec, "':' appears more than once"));
                    }
                    delims.colon = Some(i);
                }
                b'(' | b'/' | b'=' | b'<' | b'>' | b' ' => {
                    return Err(SiftError::malformed(
                        spec,
                        format!("invalid character '{}'", c as char),
                    ));
                }
                _ => {}
            }
        }

        Ok(delims)
    }
}

impl Nevra {
    pub fn from_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Reads `spec` in each of `forms`, returning one candidate per form that fits.
    ///
    /// Dashes, dots and colons inside `[...]` glob ranges are not treated as
    /// delimiters.
    ///
    /// # Errors
    ///
    /// [`SiftError::MalformedSpec`] if `spec` has more than one `:` or
    /// contains any of `( / = < >` or a space.
    pub fn parse(spec: &str, forms: &[Form]) -> SiftResult<Vec<Nevra>> {
        let delims = Delimiters::scan(spec)?;
        Ok(forms
            .iter()
            .filter_map(|&form| Self::parse_form(spec, &delims, form))
            .collect())
    }

    fn parse_form(spec: &str, d: &Delimiters, form: Form) -> Option<Nevra> {
        let end = spec.len();
        let mut nevra = Nevra::default();

        match form {
            Form::Nevra | Form::Nevr => {
                let evr_dash = d.before_last_dash.filter(|&i| i != 0)?;
                let release_dash = d.last_dash?;
                let release_end = match form {
                    Form::Nevra => d.last_dot?,
                    _ => end,
                };

                nevra.name = spec[..evr_dash].to_string();
                let mut version_start = evr_dash + 1;
                if let Some(colon) = d.colon {
                    if colon <= version_start || release_dash < colon + 2 {
                        return None;
                    }
                    nevra.epoch = spec[version_start..colon].to_string();
                    version_start = colon + 1;
                }
                if release_dash <= version_start {
                    return None;
                }
                nevra.version = spec[version_start..release_dash].to_string();

                let release_start = release_dash + 1;
                if release_end <= release_start {
                    return None;
                }
                nevra.release = spec[release_start..release_end].to_string();

                if form == Form::Nevra {
                    if end <= release_end + 1 {
                        return None;
                    }
                    nevra.arch = spec[release_end + 1..].to_string();
                }
            }
            Form::Nev => {
                let version_dash = d.last_dash.filter(|&i| i != 0)?;
                if d.before_last_dash == Some(0) {
                    return None;
                }

                nevra.name = spec[..version_dash].to_string();
                let mut version_start = version_dash + 1;
                if let Some(colon) = d.colon {
                    if colon <= version_start || end < colon + 2 {
                        return None;
                    }
                    nevra.epoch = spec[version_start..colon].to_string();
                    version_start = colon + 1;
                }
                if end <= version_start {
                    return None;
                }
                nevra.version = spec[version_start..].to_string();
            }
            Form::Na => {
                let dot = d.last_dot.filter(|&i| i != 0)?;
                if d.colon.is_some() || d.last_dash.is_some_and(|dash| dash > dot) {
                    return None;
                }
                if end - dot == 1 {
                    return None;
                }
                nevra.name = spec[..dot].to_string();
                nevra.arch = spec[dot + 1..].to_string();
            }
            Form::Name => {
                if d.colon.is_some() || spec.is_empty() {
                    return None;
                }
                nevra.name = spec.to_string();
            }
        }

        Some(nevra)
    }

    pub fn has_just_name(&self) -> bool {
        !self.name.is_empty()
            && self.epoch.is_empty()
            && self.version.is_empty()
            && self.release.is_empty()
            && self.arch.is_empty()
    }
}

/// Writes the fields that are present, e.g. `pkg-1:1.2-3.x86_64` or `pkg.noarch`.
impl fmt::Display for Nevra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.version.is_empty() {
            f.write_str("-")?;
            if !self.epoch.is_empty() {
                write!(f, "{}:", self.epoch)?;
            }
            f.write_str(&self.version)?;
        }
        if !self.release.is_empty() {
            write!(f, "-{}", self.release)?;
        }
        if !self.arch.is_empty() {
            write!(f, ".{}", self.arch)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nevra(name: &str, epoch: &str, version: &str, release: &str, arch: &str) -> Nevra {
        Nevra {
            name: name.into(),
            epoch: epoch.into(),
            version: version.into(),
            release: release.into(),
            arch: arch.into(),
        }
    }

    #[test]
    fn test_parse_full_nevra() {
        let parsed = Nevra::parse("four-of-fish-8:3.6.9-11.fc100.x86_64", &[Form::Nevra]).unwrap();
        assert_eq!(
            parsed,
            vec![nevra("four-of-fish", "8", "3.6.9", "11.fc100", "x86_64")]
        );
    }

    #[test]
    fn test_parse_default_forms() {
        let parsed = Nevra::parse("pkg-1.2-3.x86_64", &DEFAULT_PKG_SPEC_FORMS).unwrap();
        assert_eq!(
            parsed,
            vec![
                nevra("pkg", "", "1.2", "3", "x86_64"),
                nevra("pkg-1.2-3", "", "", "", "x86_64"),
                nevra("pkg-1.2-3.x86_64", "", "", "", ""),
                nevra("pkg", "", "1.2", "3.x86_64", ""),
                nevra("pkg-1.2", "", "3.x86_64", "", ""),
            ]
        );
    }

    #[test]
    fn test_parse_name_arch() {
        let parsed = Nevra::parse("pkg.x86_64", &DEFAULT_PKG_SPEC_FORMS).unwrap();
        assert_eq!(
            parsed,
            vec![
                nevra("pkg", "", "", "", "x86_64"),
                Nevra::from_name("pkg.x86_64"),
            ]
        );
    }

    #[test]
    fn test_parse_plain_name() {
        let parsed = Nevra::parse("pkg", &DEFAULT_PKG_SPEC_FORMS).unwrap();
        assert_eq!(parsed, vec![Nevra::from_name("pkg")]);
        assert!(parsed[0].has_just_name());
    }

    #[test]
    fn test_epoch_outside_evr_rejects_form() {
        let parsed = Nevra::parse("pk:g-1.2-3.x86_64", &DEFAULT_PKG_SPEC_FORMS).unwrap();
        assert!(parsed.is_empty());

        let parsed = Nevra::parse("pkg-2:1.2", &[Form::Nev, Form::Name]).unwrap();
        assert_eq!(parsed, vec![nevra("pkg", "2", "1.2", "", "")]);
    }

    #[test]
    fn test_glob_range_hides_delimiters() {
        let parsed = Nevra::parse("pkg-[1-2]-3.x86_64", &[Form::Nevra]).unwrap();
        assert_eq!(parsed, vec![nevra("pkg", "", "[1-2]", "3", "x86_64")]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Nevra::parse("a:b:c", &DEFAULT_PKG_SPEC_FORMS),
            Err(SiftError::MalformedSpec { .. })
        ));
        for spec in ["pkg(x86-64)", "/usr/bin/ls", "pkg >= 1", "a=b", "a<b"] {
            assert!(Nevra::parse(spec, &DEFAULT_PKG_SPEC_FORMS).is_err(), "{spec}");
        }
    }

    #[test]
    fn test_missing_parts() {
        assert!(Nevra::parse("-1.2-3.x86_64", &[Form::Nevra]).unwrap().is_empty());
        assert!(Nevra::parse("pkg-1.2-3.", &[Form::Nevra]).unwrap().is_empty());
        assert!(Nevra::parse("pkg.", &[Form::Na]).unwrap().is_empty());
        assert!(Nevra::parse(".x86_64", &[Form::Na]).unwrap().is_empty());
        assert!(Nevra::parse("", &[Form::Name]).unwrap().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            nevra("pkg", "1", "1.2", "3", "x86_64").to_string(),
            "pkg-1:1.2-3.x86_64"
        );
        assert_eq!(nevra("pkg", "", "", "", "noarch").to_string(), "pkg.noarch");
        assert_eq!(nevra("pkg", "", "1.2", "", "").to_string(), "pkg-1.2");
    }
}
