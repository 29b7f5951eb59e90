use rca_core::ParamValue;

/// Ordered named parameters appended to a query string.
///
/// Order is kept because it determines the literal query string. The cache
/// key is computed separately and ignores order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an existing value in place or appending.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build `appid=<id>&i=<question>&k=v...`.
///
/// Only the question is percent-encoded. Parameter values are passed through
/// untouched; invalid ones surface as transport errors.
pub fn encode_query(app_id: &str, question: &str, params: &QueryParams) -> String {
    let mut query = format!("appid={}&i={}", app_id, urlencoding::encode(question));
    for (name, value) in params.iter() {
        query.push('&');
        query.push_str(name);
        query.push('=');
        query.push_str(&value.to_string());
    }
    query
}
