//! Dependency expressions such as `libfoo.so.1` or `pkg >= 1:2.0-3`.

use std::{cmp::Ordering, fmt, str::FromStr, sync::OnceLock};

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::{error::SiftError, evr::Evr, SiftResult};

const REL_GT: u8 = 1;
const REL_EQ: u8 = 2;
const REL_LT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepOp {
    Lt,
    Lte,
    Eq,
    Gte,
    Gt,
}

impl DepOp {
    fn flags(self) -> u8 {
        match self {
            DepOp::Lt => REL_LT,
            DepOp::Lte => REL_LT | REL_EQ,
            DepOp::Eq => REL_EQ,
            DepOp::Gte => REL_GT | REL_EQ,
            DepOp::Gt => REL_GT,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            DepOp::Lt => "<",
            DepOp::Lte => "<=",
            DepOp::Eq => "=",
            DepOp::Gte => ">=",
            DepOp::Gt => ">",
        }
    }
}

impl FromStr for DepOp {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(DepOp::Lt),
            "<=" | "=<" => Ok(DepOp::Lte),
            "=" | "==" => Ok(DepOp::Eq),
            ">=" | "=>" => Ok(DepOp::Gte),
            ">" => Ok(DepOp::Gt),
            _ => Err(SiftError::malformed(s, "unknown comparison operator")),
        }
    }
}

/// A name with an optional version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reldep {
    pub name: String,
    pub constraint: Option<(DepOp, Evr)>,
}

impl Reldep {
    pub fn unversioned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
        }
    }

    pub fn versioned(name: impl Into<String>, op: DepOp, evr: Evr) -> Self {
        Self {
            name: name.into(),
            constraint: Some((op, evr)),
        }
    }

    /// Parses `name [op [epoch:]version[-release]]`.
    ///
    /// Spaces around the operator are optional.
    pub fn parse(spec: &str) -> SiftResult<Self> {
        static RELDEP_RE: OnceLock<Regex> = OnceLock::new();
        let re = RELDEP_RE.get_or_init(|| {
            Regex::new(
                r"(?x)
                ^(?P<name>[^\s<>=]+)                # dependency name
                (?:\s*(?P<op>[<>=]{1,2})\s*         # optional operator
                (?P<evr>[^\s<>=]+))?$               # followed by a version
                ",
            )
            .unwrap()
        });

        let trimmed = spec.trim();
        let caps = re.captures(trimmed).ok_or_else(|| {
            SiftError::malformed(spec, "expected 'name' or 'name <op> version'")
        })?;

        let name = caps["name"].to_string();
        let constraint = match (caps.name("op"), caps.name("evr")) {
            (Some(op), Some(evr)) => {
                let op = op
                    .as_str()
                    .parse::<DepOp>()
                    .map_err(|_| SiftError::malformed(spec, "unknown comparison operator"))?;
                Some((op, Evr::parse(evr.as_str())?))
            }
            _ => None,
        };

        Ok(Self { name, constraint })
    }

    /// Like [`Reldep::parse`], but `Ok(None)` for text that is not a
    /// dependency expression at all, such as a path with spaces.
    ///
    /// Text holding a comparison operator must still parse.
    pub fn try_parse(spec: &str) -> SiftResult<Option<Self>> {
        match Self::parse(spec) {
            Ok(reldep) => Ok(Some(reldep)),
            Err(_) if !spec.contains(['<', '>', '=']) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// True if some version satisfies both `self` and `other`.
    ///
    /// Names must be equal. An unversioned side matches every version of
    /// the other side. Releases are only compared when both sides specify one.
    pub fn intersects(&self, other: &Reldep) -> bool {
        self.name == other.name && self.ranges_overlap(other)
    }

    pub(crate) fn ranges_overlap(&self, other: &Reldep) -> bool {
        let (Some((op1, evr1)), Some((op2, evr2))) = (&self.constraint, &other.constraint) else {
            return true;
        };

        let (f1, f2) = (op1.flags(), op2.flags());
        if f1 & f2 & (REL_LT | REL_GT) != 0 {
            return true;
        }

        match evr1.cmp_release_tolerant(evr2) {
            Ordering::Equal => f1 & f2 & REL_EQ != 0,
            Ordering::Less => f1 & REL_GT != 0 || f2 & REL_LT != 0,
            Ordering::Greater => f1 & REL_LT != 0 || f2 & REL_GT != 0,
        }
    }
}

impl FromStr for Reldep {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Reldep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some((op, evr)) = &self.constraint {
            write!(f, " {} {evr}", op.symbol())?;
        }
        Ok(())
    }
}

impl Serialize for Reldep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
