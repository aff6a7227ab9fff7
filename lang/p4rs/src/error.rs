// Copyright 2024 Oxide Computer Company

use std::error::Error;
use std::fmt;

/// A bit string did not have the width a table layout requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthError {
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for WidthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} bits, got {}", self.expected, self.actual)
    }
}

impl Error for WidthError {}

/// A value could not be encoded into, or decoded from, a table layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    Width(WidthError),
    FieldCount { expected: usize, actual: usize },
    UnknownAction(String),
    UnknownTag(usize),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Width(e) => write!(f, "{}", e),
            EncodeError::FieldCount { expected, actual } => {
                write!(f, "expected {} values, got {}", expected, actual)
            }
            EncodeError::UnknownAction(name) => {
                write!(f, "table has no action {}", name)
            }
            EncodeError::UnknownTag(tag) => {
                write!(f, "action tag {} is out of range", tag)
            }
        }
    }
}

impl Error for EncodeError {}

impl From<WidthError> for EncodeError {
    fn from(e: WidthError) -> Self {
        EncodeError::Width(e)
    }
}
