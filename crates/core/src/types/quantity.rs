//! Line item quantity.

use serde::{Deserialize, Serialize};

/// Quantity of a retained cart line. Never below one.
///
/// Decrementing to zero is a removal, which goes through a different
/// operation, so any request below one clamps to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// The smallest retained quantity.
    pub const ONE: Self = Self(1);

    /// Clamp a requested quantity (possibly zero or negative) to at least one.
    #[must_use]
    pub fn clamped(requested: i64) -> Self {
        let value = requested.clamp(1, i64::from(u32::MAX));
        Self(u32::try_from(value).unwrap_or(1))
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
