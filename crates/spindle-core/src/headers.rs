//! Ordered, case-insensitive header multimap and translation to/from [`http::HeaderMap`]

use crate::{Error, Result};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;

/// Ordered header multimap.
///
/// Lookups ignore ASCII case, the first spelling of a name is preserved, and
/// values for a name keep their insertion order.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderCollection {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a native header map, appending every value in order
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut headers = Self::new();
        for (name, value) in map.iter() {
            headers.add(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        headers
    }

    /// Re-encode into a native header map
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        self.append_to(&mut map)?;
        Ok(map)
    }

    /// Append all values onto an existing native header map
    pub fn append_to(&self, map: &mut HeaderMap) -> Result<()> {
        for (name, values) in &self.entries {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
            for value in values {
                let header_value = HeaderValue::from_str(value)
                    .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
                map.append(header_name.clone(), header_value);
            }
        }
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Append a value, keeping any existing ones
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// Append several values for one name
    pub fn add_all<I, V>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = name.into();
        for value in values {
            self.add(name.clone(), value);
        }
    }

    /// Replace all values of a name with a single value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = vec![value.into()],
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// First value of a name
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// All values of a name, in insertion order
    pub fn get_all(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(idx) => &self.entries[idx].1,
            None => &[],
        }
    }

    /// Remove a name and return its values
    pub fn remove(&mut self, name: &str) -> Vec<String> {
        match self.position(name) {
            Some(idx) => self.entries.remove(idx).1,
            None => Vec::new(),
        }
    }

    /// Whether a name is present
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate names with their values
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Iterate names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for HeaderCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl From<&HeaderMap> for HeaderCollection {
    fn from(map: &HeaderMap) -> Self {
        Self::from_header_map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_preserves_multi_values() {
        let mut headers = HeaderCollection::new();
        headers.add("Accept", "text/html");
        headers.add("accept", "application/json");
        headers.add("X-Trace", "1");

        assert_eq!(headers.len(), 2);
        assert_eq!(
            headers.get_all("ACCEPT"),
            &["text/html".to_string(), "application/json".to_string()]
        );
        assert_eq!(headers.names().collect::<Vec<_>>(), vec!["Accept", "X-Trace"]);
    }

    #[test]
    fn test_set_replaces() {
        let mut headers = HeaderCollection::new();
        headers.add("vary", "a");
        headers.add("vary", "b");
        headers.set("Vary", "c");
        assert_eq!(headers.get_all("vary"), &["c".to_string()]);
    }

    #[test]
    fn test_from_header_map_appends() {
        let mut map = HeaderMap::new();
        map.append("cookie", HeaderValue::from_static("a=1"));
        map.append("cookie", HeaderValue::from_static("b=2"));
        map.append("host", HeaderValue::from_static("example.com"));

        let headers = HeaderCollection::from_header_map(&map);
        assert_eq!(headers.get_all("cookie").len(), 2);
        assert_eq!(headers.get_first("host"), Some("example.com"));
    }

    #[test]
    fn test_invalid_value_rejected() {
        let mut headers = HeaderCollection::new();
        headers.add("x-bad", "line\nbreak");
        assert!(matches!(
            headers.to_header_map(),
            Err(Error::InvalidHeader(_))
        ));
    }

    fn header_entries() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
        prop::collection::vec(
            (
                "[a-z][a-z0-9-]{0,12}",
                prop::collection::vec("[!-~]([ -~]{0,16}[!-~])?", 1..4),
            ),
            0..8,
        )
    }

    proptest! {
        #[test]
        fn round_trip_preserves_keys_and_value_order(entries in header_entries()) {
            let mut map = HeaderMap::new();
            for (name, values) in &entries {
                let name = HeaderName::from_bytes(name.as_bytes()).unwrap();
                for value in values {
                    map.append(name.clone(), HeaderValue::from_str(value).unwrap());
                }
            }

            let translated = HeaderCollection::from_header_map(&map);
            let encoded = translated.to_header_map().unwrap();

            prop_assert_eq!(map.keys_len(), encoded.keys_len());
            for name in map.keys() {
                let original: Vec<_> = map.get_all(name).iter().collect();
                let round_tripped: Vec<_> = encoded.get_all(name).iter().collect();
                prop_assert_eq!(original, round_tripped);
            }
        }
    }
}
