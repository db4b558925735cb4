//! Bounds-checked result limits
//!
//! Limits are interpolated into query text, so they only exist as a
//! validated integer in [`Limit::MIN`, `Limit::MAX`].

use crate::error::{Error, Result};
use std::fmt;

/// A validated row limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Limit(u32);

impl Limit {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 1000;

    /// Validate an integer limit
    pub fn new(value: u32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Self::invalid(value.to_string()))
        }
    }

    /// Parse a limit from request text
    pub fn parse(raw: &str) -> Result<Self> {
        let value: u32 = raw
            .trim()
            .parse()
            .map_err(|_| Self::invalid(raw.to_string()))?;
        Self::new(value)
    }

    /// Parse an optional limit, falling back to `default`
    pub fn parse_or(raw: Option<&str>, default: u32) -> Result<Self> {
        match raw {
            Some(raw) => Self::parse(raw),
            None => Self::new(default),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    fn invalid(value: String) -> Error {
        Error::InvalidLimit {
            value,
            min: Self::MIN,
            max: Self::MAX,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
