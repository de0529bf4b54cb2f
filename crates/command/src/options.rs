//! Structured option sets flattened into argument tokens by
//! [`CommandSpec::add_args`](crate::CommandSpec::add_args).

use cmdrelay_common::InputSource;

/// Reserved key: a positional input token added before any option.
pub const INPUT_KEY: &str = "input";
/// Reserved key: a URL becomes the remote dispatch target, anything else a
/// positional token.
pub const INPUT_ARG_KEY: &str = "inputArg";

/// One element of a list-valued option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItem {
    /// Renders as `--key value`.
    Value(String),
    /// Renders as `--key name value`.
    Pair(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Scalar(String),
    List(Vec<ListItem>),
}

impl OptionValue {
    /// Build a list of `(name, value)` pairs such as repeated `--cookie`
    /// entries.
    pub fn pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::List(
            pairs
                .into_iter()
                .map(|(k, v)| ListItem::Pair(k.into(), v.into()))
                .collect(),
        )
    }

    /// Plain-text rendering used for the reserved input keys.
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::List(items) => items
                .iter()
                .map(|item| match item {
                    ListItem::Value(value) => value.clone(),
                    ListItem::Pair(name, value) => format!("{name} {value}"),
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<Vec<&str>> for OptionValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(
            values
                .into_iter()
                .map(|v| ListItem::Value(v.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values.into_iter().map(ListItem::Value).collect())
    }
}

impl From<Vec<ListItem>> for OptionValue {
    fn from(items: Vec<ListItem>) -> Self {
        Self::List(items)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionEntry {
    /// Positional entry whose value is itself a flag name: renders `--name`.
    Flag(String),
    Named(String, OptionValue),
}

/// Ordered option map. Named keys are unique; setting an existing key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    entries: Vec<OptionEntry>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.entries.push(OptionEntry::Flag(name.into()));
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn input<S: InputSource + ?Sized>(self, source: &S) -> Self {
        self.set(INPUT_KEY, source.input_string())
    }

    pub fn input_arg<S: InputSource + ?Sized>(self, source: &S) -> Self {
        self.set(INPUT_ARG_KEY, source.input_string())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        let key = key.into();
        let value = value.into();
        let existing = self.entries.iter_mut().find_map(|entry| match entry {
            OptionEntry::Named(name, slot) if *name == key => Some(slot),
            _ => None,
        });
        match existing {
            Some(slot) => *slot = value,
            None => self.entries.push(OptionEntry::Named(key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.iter().find_map(|entry| match entry {
            OptionEntry::Named(name, value) if name == key => Some(value),
            _ => None,
        })
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        let idx = self
            .entries
            .iter()
            .position(|entry| matches!(entry, OptionEntry::Named(name, _) if name == key))?;
        match self.entries.remove(idx) {
            OptionEntry::Named(_, value) => Some(value),
            OptionEntry::Flag(_) => None,
        }
    }

    pub fn entries(&self) -> &[OptionEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Options {
    type Item = OptionEntry;
    type IntoIter = std::vec::IntoIter<OptionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
