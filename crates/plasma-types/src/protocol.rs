//! Finality protocols a transaction type can be registered under.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PlasmaError, Result};

/// Finality protocol.
///
/// - **MVP**: inclusion proof plus an explicit confirmation signature.
/// - **MoreVP**: inclusion proof only; in-flight transactions are
///   optimistically accepted and resolved by challenges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Protocol {
    Mvp = 1,
    MoreVp = 2,
}

impl Protocol {
    /// Parse a raw protocol tag.
    ///
    /// # Errors
    /// [`PlasmaError::InvalidProtocol`] for anything but 1 or 2.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(Self::Mvp),
            2 => Ok(Self::MoreVp),
            other => Err(PlasmaError::InvalidProtocol(other)),
        }
    }

    #[must_use]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Protocol {
    type Error = PlasmaError;

    fn try_from(tag: u8) -> Result<Self> {
        Self::from_tag(tag)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mvp => write!(f, "MVP"),
            Self::MoreVp => write!(f, "MORE_VP"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags() {
        assert_eq!(Protocol::from_tag(1).unwrap(), Protocol::Mvp);
        assert_eq!(Protocol::from_tag(2).unwrap(), Protocol::MoreVp);
        assert_eq!(Protocol::MoreVp.tag(), 2);
    }

    #[test]
    fn unknown_tags_rejected() {
        for tag in [0u8, 3, 199, u8::MAX] {
            let err = Protocol::try_from(tag).unwrap_err();
            assert!(matches!(err, PlasmaError::InvalidProtocol(t) if t == tag));
        }
    }
}
