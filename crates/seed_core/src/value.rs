use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Optional snapshot field that keeps "absent" apart from an explicit `null`.
///
/// Deserialize with `#[serde(default)]` so a missing key becomes [`Patch::Missing`].
/// On update, `Missing` leaves the stored column untouched while `Null` clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Missing,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    /// Present value, treating `Missing` and `Null` alike.
    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Converts a present value, keeping `Missing` and `Null` as they are.
    pub fn try_map<U, E>(self, func: impl FnOnce(T) -> Result<U, E>) -> Result<Patch<U>, E> {
        Ok(match self {
            Patch::Missing => Patch::Missing,
            Patch::Null => Patch::Null,
            Patch::Value(value) => Patch::Value(func(value)?),
        })
    }

    /// Collapse `Null` into `Missing`: the field is only written when a value exists.
    pub fn unless_null(self) -> Patch<T> {
        match self {
            Patch::Null => Patch::Missing,
            other => other,
        }
    }

    /// Apply onto a stored column, leaving it unchanged when `Missing`.
    pub fn merge_into(self, slot: &mut Option<T>) {
        match self {
            Patch::Missing => {}
            Patch::Null => *slot = None,
            Patch::Value(value) => *slot = Some(value),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T> Serialize for Patch<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Value(value) => serializer.serialize_some(value),
            _ => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Patch;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Envelope {
        #[serde(default)]
        field: Patch<String>,
    }

    #[test]
    fn keeps_absent_apart_from_null() {
        let absent: Envelope = serde_json::from_value(json!({})).expect("absent");
        assert_eq!(absent.field, Patch::Missing);
        let null: Envelope = serde_json::from_value(json!({ "field": null })).expect("null");
        assert_eq!(null.field, Patch::Null);
        let value: Envelope = serde_json::from_value(json!({ "field": "x" })).expect("value");
        assert_eq!(value.field, Patch::Value("x".to_string()));
    }

    #[test]
    fn merge_leaves_slot_alone_when_missing() {
        let mut slot = Some(1);
        Patch::Missing.merge_into(&mut slot);
        assert_eq!(slot, Some(1));
        Patch::Value(2).merge_into(&mut slot);
        assert_eq!(slot, Some(2));
        Patch::<i32>::Null.merge_into(&mut slot);
        assert_eq!(slot, None);
    }
}
