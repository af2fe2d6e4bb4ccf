use std::fmt;

use serde::{Deserialize, Serialize};

/// Serialization strategy selected for a (value type, archive type) pair.
///
/// Selection is a pure function of the two types; it never depends on the
/// value being written or on traversal order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyChoice {
    /// The value is written as one contiguous little-endian byte block.
    RawBytes,
    /// The value is written piece by piece through the archive.
    ElementWise,
    /// The value is an enum written as its underlying integer.
    EnumProjected,
    /// The value is written through a user-supplied minimal representation.
    UserMinimal,
    /// The value is an owning or non-owning reference routed through the
    /// shared object registry.
    SharedReference,
}

impl StrategyChoice {
    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RawBytes => "raw_bytes",
            Self::ElementWise => "element_wise",
            Self::EnumProjected => "enum_projected",
            Self::UserMinimal => "user_minimal",
            Self::SharedReference => "shared_reference",
        }
    }
}

impl fmt::Display for StrategyChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
