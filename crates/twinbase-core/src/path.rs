//! IdShort path grammar
//!
//! Named segments are separated by `.`; `[n]` addresses the n-th child of a
//! list. Segments mix freely, e.g. `a.b[2].c` or `Matrix[0][1]`. The single
//! character path `.` denotes the container itself.

use crate::errors::{Result, TwinError};

pub const PATH_SEPARATOR: char = '.';
pub const THIS: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Name(String),
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Name(name) => f.write_str(name),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Parsed path; no segments means "this container"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IdShortPath {
    segments: Vec<PathSegment>,
}

impl IdShortPath {
    /// Path addressing the container itself
    pub fn this() -> Self {
        Self::default()
    }

    /// Parse a path string
    ///
    /// # Errors
    /// * `InvalidPath` - On empty input, empty names, unterminated or
    ///   non-numeric brackets, or a name directly following `]`
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| TwinError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("path is empty"));
        }
        if raw == THIS {
            return Ok(Self::this());
        }

        let mut segments = Vec::new();
        let mut name = String::new();
        let mut chars = raw.chars().peekable();
        // true right after a separator or at the start
        let mut expect_name = true;

        while let Some(c) = chars.next() {
            match c {
                PATH_SEPARATOR => {
                    if name.is_empty() && expect_name {
                        return Err(invalid("empty segment"));
                    }
                    if !name.is_empty() {
                        segments.push(PathSegment::Name(std::mem::take(&mut name)));
                    }
                    expect_name = true;
                }
                '[' => {
                    if !name.is_empty() {
                        segments.push(PathSegment::Name(std::mem::take(&mut name)));
                    } else if expect_name && !segments.is_empty() {
                        return Err(invalid("index must follow a name or index"));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(invalid("index must be numeric")),
                            None => return Err(invalid("unterminated index")),
                        }
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| invalid("index must be numeric"))?;
                    segments.push(PathSegment::Index(index));
                    expect_name = false;
                    if let Some(&next) = chars.peek() {
                        if next != PATH_SEPARATOR && next != '[' {
                            return Err(invalid("name must be separated by '.'"));
                        }
                    }
                }
                ']' => return Err(invalid("unbalanced ']'")),
                other => {
                    name.push(other);
                    expect_name = true;
                }
            }
        }

        if !name.is_empty() {
            segments.push(PathSegment::Name(name));
        } else if raw.ends_with(PATH_SEPARATOR) {
            return Err(invalid("trailing separator"));
        }

        Ok(Self { segments })
    }

    pub fn is_this(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Path of the parent and the final segment
    pub fn split_last(&self) -> Option<(IdShortPath, &PathSegment)> {
        self.segments.split_last().map(|(last, rest)| {
            (
                IdShortPath {
                    segments: rest.to_vec(),
                },
                last,
            )
        })
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }
}

impl std::fmt::Display for IdShortPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(THIS);
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Name(_)) {
                write!(f, "{}", PATH_SEPARATOR)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for IdShortPath {
    type Err = TwinError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Path of a child given its parent's path
///
/// List children get a bracket segment appended directly; named children are
/// dot-joined, or stand alone directly under the root.
pub fn child_path(parent_path: &str, parent_is_list: bool, id_short: Option<&str>, index: usize) -> String {
    match (parent_is_list, id_short) {
        (false, Some(id)) if parent_path.is_empty() => id.to_string(),
        (false, Some(id)) => format!("{}{}{}", parent_path, PATH_SEPARATOR, id),
        _ => format!("{}[{}]", parent_path, index),
    }
}

/// Check that an IdShort can be used as a path segment
///
/// # Errors
/// * `InvalidIdShort` - If empty or containing `.`, `[` or `]`
pub fn validate_id_short(id_short: &str) -> Result<()> {
    let invalid = |reason: &str| TwinError::InvalidIdShort {
        id_short: id_short.to_string(),
        reason: reason.to_string(),
    };
    if id_short.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if id_short.contains(|c| c == PATH_SEPARATOR || c == '[' || c == ']') {
        return Err(invalid("must not contain '.', '[' or ']'"));
    }
    Ok(())
}
