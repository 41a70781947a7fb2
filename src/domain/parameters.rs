use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

/// Immutable key/value input of a fetch.
///
/// Cloning is cheap; the map is shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: Arc<BTreeMap<String, Value>>,
}

impl Parameters {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// String form of a value as it would be substituted into a URL.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(value_to_string)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// New parameters holding every key of `self`, overridden by `other`.
    pub fn with(&self, other: &Parameters) -> Parameters {
        if other.is_empty() {
            return self.clone();
        }
        let mut values = (*self.values).clone();
        for (key, value) in other.values.iter() {
            values.insert(key.clone(), value.clone());
        }
        Parameters {
            values: Arc::new(values),
        }
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Parameters {
            values: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Parameters
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_overrides_left_keys() {
        let base = Parameters::from([("a", "1"), ("b", "2")]);
        let merged = base.with(&Parameters::from([("b", "3"), ("c", "4")]));

        assert_eq!(merged.get_str("a").as_deref(), Some("1"));
        assert_eq!(merged.get_str("b").as_deref(), Some("3"));
        assert_eq!(merged.get_str("c").as_deref(), Some("4"));
        // base is unchanged
        assert_eq!(base.get_str("b").as_deref(), Some("2"));
        assert!(!base.contains("c"));
    }

    #[test]
    fn test_with_empty_is_identity() {
        let base = Parameters::from([("a", "1")]);
        assert_eq!(base.with(&Parameters::empty()), base);
        assert_eq!(Parameters::empty().with(&base), base);
    }

    #[test]
    fn test_non_string_values() {
        let params: Parameters = vec![
            ("n", Value::from(42)),
            ("flag", Value::from(true)),
            ("none", Value::Null),
        ]
        .into_iter()
        .collect();

        assert_eq!(params.get_str("n").as_deref(), Some("42"));
        assert_eq!(params.get_str("flag").as_deref(), Some("true"));
        assert_eq!(params.get_str("none"), None);
        assert_eq!(params.len(), 3);
    }
}
