//! Ordered, already-escaped argument tokens.

use cmdrelay_common::{escape_arg, escape_key, Locale, Platform};

/// Value attached to an argument key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Scalar(String),
    /// Each element is escaped on its own and the results joined by spaces.
    List(Vec<String>),
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for ArgValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for ArgValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ArgValue {
    fn from(values: [&str; N]) -> Self {
        Self::List(values.iter().map(|v| v.to_string()).collect())
    }
}

/// How a key is joined to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `--key value`
    Space,
    /// `--key=value`, selected by a key written with a trailing `=`.
    Equals,
}

impl Separator {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Space => " ",
            Self::Equals => "=",
        }
    }
}

/// One argument unit destined for the final invocation string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentToken {
    key: String,
    value: Option<ArgValue>,
    separator: Separator,
    rendered: String,
}

impl ArgumentToken {
    /// Key without the trailing `=` that selects [`Separator::Equals`].
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&ArgValue> {
        self.value.as_ref()
    }

    pub fn separator(&self) -> Separator {
        self.separator
    }

    /// The token as it appears on the command line.
    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl std::fmt::Display for ArgumentToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Accumulates argument tokens in insertion order.
///
/// Tokens are rendered when added, using the escaping rules in force at that
/// moment; later changes to the defaults do not touch existing tokens.
#[derive(Debug, Clone)]
pub struct ArgumentBuilder {
    tokens: Vec<ArgumentToken>,
    escape_default: bool,
    platform: Platform,
    locale: Option<Locale>,
}

impl Default for ArgumentBuilder {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

impl ArgumentBuilder {
    pub fn new(platform: Platform) -> Self {
        Self {
            tokens: Vec::new(),
            escape_default: true,
            platform,
            locale: None,
        }
    }

    pub fn escape_default(&self) -> bool {
        self.escape_default
    }

    pub fn set_escape_default(&mut self, escape: bool) -> &mut Self {
        self.escape_default = escape;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn set_platform(&mut self, platform: Platform) -> &mut Self {
        self.platform = platform;
        self
    }

    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    pub fn set_locale(&mut self, locale: Option<Locale>) -> &mut Self {
        self.locale = locale;
        self
    }

    /// Add `key` followed by `value`, escaped per the instance default.
    pub fn add_arg(&mut self, key: &str, value: impl Into<ArgValue>) -> &mut Self {
        self.add_arg_with(key, Some(value.into()), None)
    }

    /// Add a bare `key` token.
    pub fn add_flag(&mut self, key: &str) -> &mut Self {
        self.add_arg_with(key, None, None)
    }

    /// Add an argument, optionally overriding the escape default for this
    /// call only.
    ///
    /// A key ending in `=` is joined to its value with `=` instead of a
    /// space. Key and value are escaped independently: values are always
    /// quoted, keys and bare tokens only when they contain characters the
    /// shell would interpret.
    pub fn add_arg_with(
        &mut self,
        key: &str,
        value: Option<ArgValue>,
        escape: Option<bool>,
    ) -> &mut Self {
        let escape = escape.unwrap_or(self.escape_default);
        let locale = self.locale.as_ref();
        let platform = self.platform;
        let quote = |raw: &str| {
            if escape {
                escape_arg(raw, platform, locale)
            } else {
                raw.to_string()
            }
        };
        let quote_key = |raw: &str| {
            if escape {
                escape_key(raw, platform, locale)
            } else {
                raw.to_string()
            }
        };

        let (bare_key, separator) = match key.strip_suffix('=') {
            Some(stripped) => (stripped, Separator::Equals),
            None => (key, Separator::Space),
        };

        let rendered = match &value {
            None => quote_key(key),
            Some(ArgValue::Scalar(v)) => {
                format!("{}{}{}", quote_key(bare_key), separator.as_str(), quote(v.as_str()))
            }
            Some(ArgValue::List(values)) => {
                let joined = values
                    .iter()
                    .map(|v| quote(v.as_str()))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{}{}{}", quote_key(bare_key), separator.as_str(), joined)
            }
        };

        self.tokens.push(ArgumentToken {
            key: bare_key.to_string(),
            value,
            separator,
            rendered,
        });
        self
    }

    pub fn tokens(&self) -> &[ArgumentToken] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// All tokens joined by single spaces.
    pub fn line(&self) -> String {
        self.tokens
            .iter()
            .map(ArgumentToken::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn unix() -> ArgumentBuilder {
        ArgumentBuilder::new(Platform::Unix)
    }

    #[test]
    fn space_separator_escapes_key_and_value() {
        let mut args = unix();
        args.add_arg("--page-size", "A4");
        assert_eq!(args.line(), "--page-size 'A4'");
        assert_eq!(args.tokens()[0].separator(), Separator::Space);
        assert_eq!(args.tokens()[0].key(), "--page-size");
    }

    #[test]
    fn equals_separator_strips_trailing_equals() {
        let mut args = unix();
        args.set_escape_default(false);
        args.add_arg("--title=", "Report");
        let token = &args.tokens()[0];
        assert_eq!(token.as_str(), "--title=Report");
        assert_eq!(token.key(), "--title");
        assert_eq!(token.separator(), Separator::Equals);
    }

    #[test]
    fn list_values_are_escaped_individually() {
        let mut args = unix();
        args.add_arg("--exclude=", ["a", "b"]);
        assert_eq!(args.tokens()[0].as_str(), "--exclude='a' 'b'");
    }

    #[test]
    fn bare_key_without_value() {
        let mut args = unix();
        args.add_flag("--quiet");
        args.add_arg_with("--no-outline", None, Some(false));
        assert_eq!(args.line(), "--quiet --no-outline");
    }

    #[test]
    fn escape_override_applies_to_one_call_only() {
        let mut args = unix();
        args.set_escape_default(false);
        args.add_arg_with("--header", Some("a b".into()), Some(true));
        args.add_arg("--footer", "c d");
        assert_eq!(args.line(), "--header 'a b' --footer c d");
        assert!(!args.escape_default());
    }

    #[test]
    fn preserves_insertion_order_and_duplicates() {
        let mut args = unix();
        args.set_escape_default(false);
        args.add_arg("--cookie", "b")
            .add_arg("--cookie", "a")
            .add_flag("--quiet")
            .add_arg("--cookie", "b");
        assert_eq!(args.len(), 4);
        assert_eq!(args.line(), "--cookie b --cookie a --quiet --cookie b");
    }

    #[test]
    fn locale_only_affects_escaped_tokens() {
        let mut args = unix();
        args.set_locale(Some(Locale::new("C")));
        args.add_arg("--title", "Café");
        args.add_arg_with("--raw", Some("Café".into()), Some(false));
        assert_eq!(args.line(), "--title 'Caf' --raw Café");
    }

    #[test]
    fn windows_quoting() {
        let mut args = ArgumentBuilder::new(Platform::Windows);
        args.add_arg("--footer-center", "Page 100%");
        assert_eq!(args.line(), "--footer-center \"Page 100 \"");
    }

    #[test]
    fn empty_builder_has_empty_line() {
        let args = unix();
        assert!(args.is_empty());
        assert_eq!(args.line(), "");
    }
}
