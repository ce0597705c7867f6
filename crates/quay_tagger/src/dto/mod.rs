use serde::{Deserialize, Deserializer};

pub mod build;
pub mod tag;

/// Deserialize a field that may be `null` on the wire, falling back to the
/// type's default value.
///
/// Quay omits or nulls fields freely depending on the trigger kind, and an
/// absent value should never reject the whole payload.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
