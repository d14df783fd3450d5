//! Serde helpers shared by the wire types.

use serde::{Deserialize, Deserializer};

/// Deserialize a field, treating an explicit `null` like a missing field.
///
/// The CLI writes `null` for empty lists, maps and counters in some records.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
