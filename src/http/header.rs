/// An ordered list of header fields.
///
/// Lookups are case-insensitive. Inserting a key that is already present
/// replaces its value in place, so the position of the first insertion is
/// what serialization sees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a header, keeping the key as given.
    ///
    /// CR and LF are stripped from both key and value so a field can never
    /// break out of its line when serialized.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = strip_line_breaks(key.into());
        let value = strip_line_breaks(value.into());

        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub(crate) fn strip_line_breaks(mut field: String) -> String {
    if field.contains(['\r', '\n']) {
        field.retain(|c| c != '\r' && c != '\n');
    }
    field
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}
