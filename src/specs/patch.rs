use serde::{Deserialize, Deserializer};

/// One field of a partial update payload.
///
/// A field missing from the payload deserializes to `Absent` (via
/// `#[serde(default)]`); an explicit JSON `null` becomes `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPatch<T> {
    Absent,
    Null,
    Set(T),
}

impl<T> Default for FieldPatch<T> {
    fn default() -> Self {
        FieldPatch::Absent
    }
}

impl<T> FieldPatch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldPatch::Absent)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            FieldPatch::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<'de, T> Deserialize<'de> for FieldPatch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => FieldPatch::Set(value),
            None => FieldPatch::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default)]
        ram_gb: FieldPatch<i32>,
    }

    #[test]
    fn distinguishes_absent_null_and_value() {
        let absent: Probe = serde_json::from_str("{}").unwrap();
        let null: Probe = serde_json::from_str(r#"{"ram_gb": null}"#).unwrap();
        let set: Probe = serde_json::from_str(r#"{"ram_gb": 32}"#).unwrap();

        assert!(absent.ram_gb.is_absent());
        assert_eq!(null.ram_gb, FieldPatch::Null);
        assert_eq!(set.ram_gb.as_set(), Some(&32));
    }
}
