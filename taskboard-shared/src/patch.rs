/// Tri-state field wrapper for partial updates
///
/// A patch payload has to tell "the client did not send this field" apart
/// from "the client sent this field", including the case where the sent value
/// itself means "empty" (`null` for an optional column). `PatchField<T>`
/// carries exactly that distinction:
///
/// - `Unset`: the key was absent, leave the stored value alone
/// - `Present(value)`: replace the stored value with `value`
///
/// # Serde
///
/// Fields must be declared with `#[serde(default)]` so a missing key becomes
/// `Unset`. A present key always deserializes to `Present`, so for
/// `PatchField<Option<T>>` an explicit `null` becomes `Present(None)`.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use taskboard_shared::patch::PatchField;
///
/// #[derive(Deserialize)]
/// struct Update {
///     #[serde(default)]
///     content: PatchField<Option<String>>,
///     #[serde(default)]
///     title: PatchField<String>,
/// }
///
/// let update: Update = serde_json::from_str(r#"{ "content": null }"#).unwrap();
/// assert_eq!(update.content, PatchField::Present(None));
/// assert_eq!(update.title, PatchField::Unset);
/// ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchField<T> {
    /// Field not supplied
    Unset,

    /// Field supplied with this value
    Present(T),
}

impl<T> Default for PatchField<T> {
    fn default() -> Self {
        PatchField::Unset
    }
}

impl<T> PatchField<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, PatchField::Unset)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, PatchField::Present(_))
    }

    pub fn as_ref(&self) -> PatchField<&T> {
        match self {
            PatchField::Unset => PatchField::Unset,
            PatchField::Present(value) => PatchField::Present(value),
        }
    }

    pub fn map<U, F>(self, f: F) -> PatchField<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            PatchField::Unset => PatchField::Unset,
            PatchField::Present(value) => PatchField::Present(f(value)),
        }
    }

    /// Like `map`, but the conversion may fail
    pub fn try_map<U, E, F>(self, f: F) -> Result<PatchField<U>, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        match self {
            PatchField::Unset => Ok(PatchField::Unset),
            PatchField::Present(value) => f(value).map(PatchField::Present),
        }
    }

    /// Returns the supplied value, if any
    pub fn into_option(self) -> Option<T> {
        match self {
            PatchField::Unset => None,
            PatchField::Present(value) => Some(value),
        }
    }

    /// Writes the value into `target` when present
    ///
    /// Returns whether `target` was overwritten.
    pub fn apply_to(self, target: &mut T) -> bool {
        match self {
            PatchField::Unset => false,
            PatchField::Present(value) => {
                *target = value;
                true
            }
        }
    }
}

impl<T> From<T> for PatchField<T> {
    fn from(value: T) -> Self {
        PatchField::Present(value)
    }
}

impl<'de, T> Deserialize<'de> for PatchField<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(PatchField::Present)
    }
}

/// Serializes `Present(v)` as `v`; pair with
/// `skip_serializing_if = "PatchField::is_unset"` to omit unset keys.
impl<T> Serialize for PatchField<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PatchField::Unset => serializer.serialize_none(),
            PatchField::Present(value) => value.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, Serialize)]
    struct Sample {
        #[serde(default, skip_serializing_if = "PatchField::is_unset")]
        name: PatchField<String>,
        #[serde(default, skip_serializing_if = "PatchField::is_unset")]
        note: PatchField<Option<String>>,
    }

    #[test]
    fn test_missing_key_is_unset() {
        let sample: Sample = serde_json::from_str("{}").unwrap();
        assert!(sample.name.is_unset());
        assert!(sample.note.is_unset());
    }

    #[test]
    fn test_null_is_present_none() {
        let sample: Sample = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(sample.note, PatchField::Present(None));
        assert!(sample.name.is_unset());
    }

    #[test]
    fn test_value_is_present() {
        let sample: Sample = serde_json::from_str(r#"{"name": "x", "note": "y"}"#).unwrap();
        assert_eq!(sample.name, PatchField::Present("x".to_string()));
        assert_eq!(sample.note, PatchField::Present(Some("y".to_string())));
    }

    #[test]
    fn test_null_for_required_type_is_rejected() {
        let result: Result<Sample, _> = serde_json::from_str(r#"{"name": null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_skips_unset() {
        let sample = Sample {
            name: PatchField::Unset,
            note: PatchField::Present(None),
        };
        assert_eq!(serde_json::to_string(&sample).unwrap(), r#"{"note":null}"#);
    }

    #[test]
    fn test_apply_to() {
        let mut title = "old".to_string();
        assert!(!PatchField::<String>::Unset.apply_to(&mut title));
        assert_eq!(title, "old");

        assert!(PatchField::Present("new".to_string()).apply_to(&mut title));
        assert_eq!(title, "new");

        let mut description = Some("text".to_string());
        PatchField::Present(None).apply_to(&mut description);
        assert_eq!(description, None);
    }

    #[test]
    fn test_try_map_short_circuits() {
        let unset: PatchField<&str> = PatchField::Unset;
        let mapped: Result<PatchField<usize>, String> = unset.try_map(|_| Err("called".to_string()));
        assert_eq!(mapped, Ok(PatchField::Unset));

        let present = PatchField::Present("abc");
        let mapped: Result<PatchField<usize>, String> = present.try_map(|s| Ok(s.len()));
        assert_eq!(mapped, Ok(PatchField::Present(3)));
    }
}
