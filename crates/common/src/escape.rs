//! Quoting of arguments and base commands for a target shell.
//!
//! Escaping is a pure function of the input text, the target [`Platform`] and
//! an optional [`Locale`]. No process-wide locale state is read or modified.

use serde::{Deserialize, Serialize};

use crate::Platform;

/// Locale identifier in `language_TERRITORY.codeset@modifier` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Codeset part of the identifier, if any (`UTF-8` in `en_US.UTF-8`).
    pub fn codeset(&self) -> Option<&str> {
        let (_, rest) = self.0.split_once('.')?;
        Some(rest.split('@').next().unwrap_or(rest))
    }

    /// Whether escaping under this locale treats text as single bytes.
    ///
    /// `C` and `POSIX` without a codeset, and any explicit non-UTF-8 codeset,
    /// are byte oriented: characters outside ASCII are dropped.
    pub fn is_byte_oriented(&self) -> bool {
        match self.codeset() {
            Some(codeset) => {
                let normalized = codeset.to_ascii_lowercase().replace('-', "");
                normalized != "utf8"
            }
            None => {
                let name = self.0.split('@').next().unwrap_or(&self.0);
                matches!(name, "C" | "POSIX")
            }
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn apply_locale<'a>(raw: &'a str, locale: Option<&Locale>) -> std::borrow::Cow<'a, str> {
    match locale {
        Some(locale) if locale.is_byte_oriented() && !raw.is_ascii() => {
            std::borrow::Cow::Owned(raw.chars().filter(char::is_ascii).collect())
        }
        _ => std::borrow::Cow::Borrowed(raw),
    }
}

/// Quote a single argument so the target shell passes it through verbatim.
///
/// Unix wraps in single quotes and renders an embedded `'` as `'\''`.
/// Windows wraps in double quotes; `"`, `%` and `!` cannot be quoted for
/// `cmd.exe` and are replaced by spaces.
pub fn escape_arg(raw: &str, platform: Platform, locale: Option<&Locale>) -> String {
    let text = apply_locale(raw, locale);
    let mut out = String::with_capacity(text.len() + 2);
    match platform {
        Platform::Unix => {
            out.push('\'');
            for ch in text.chars() {
                if ch == '\'' {
                    out.push_str("'\\''");
                } else {
                    out.push(ch);
                }
            }
            out.push('\'');
        }
        Platform::Windows => {
            out.push('"');
            for ch in text.chars() {
                match ch {
                    '"' | '%' | '!' => out.push(' '),
                    _ => out.push(ch),
                }
            }
            out.push('"');
        }
    }
    out
}

fn is_plain_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(ch, '-' | '_' | '.' | '/' | '=' | ':' | ',' | '@' | '+')
}

/// Quote an option key or bare word only when the shell could misread it.
///
/// Words made solely of ASCII letters, digits and `-_./=:,@+` pass through
/// unchanged (`--page-size`, `/tmp/in.html`); anything else, including the
/// empty string, is quoted exactly like [`escape_arg`].
pub fn escape_key(raw: &str, platform: Platform, locale: Option<&Locale>) -> String {
    if !raw.is_empty() && raw.chars().all(is_plain_word_char) {
        return raw.to_string();
    }
    escape_arg(raw, platform, locale)
}

const SHELL_META: &[char] = &[
    '#', '&', ';', '`', '|', '*', '?', '~', '<', '>', '^', '(', ')', '[', ']', '{', '}', '$',
    '\\', ',', '\n', '\u{ff}',
];

/// Neutralize shell metacharacters in a whole base command.
///
/// Metacharacters are prefixed with `\` on Unix and `^` on Windows (where `%`
/// and `!` are escaped too). Quotes are only escaped when they have no
/// matching partner further along the string.
pub fn escape_command(raw: &str, platform: Platform) -> String {
    let (marker, extra): (char, &[char]) = match platform {
        Platform::Unix => ('\\', &[]),
        Platform::Windows => ('^', &['%', '!']),
    };

    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len() + 8);
    let mut open_quote: Option<char> = None;

    for (idx, &ch) in chars.iter().enumerate() {
        match ch {
            '"' | '\'' => match open_quote {
                None if chars[idx + 1..].contains(&ch) => {
                    open_quote = Some(ch);
                    out.push(ch);
                }
                Some(quote) if quote == ch => {
                    open_quote = None;
                    out.push(ch);
                }
                _ => {
                    out.push(marker);
                    out.push(ch);
                }
            },
            _ if SHELL_META.contains(&ch) || extra.contains(&ch) => {
                out.push(marker);
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unix_quotes_plain_and_embedded_single_quotes() {
        assert_eq!(escape_arg("a b", Platform::Unix, None), "'a b'");
        assert_eq!(escape_arg("it's", Platform::Unix, None), "'it'\\''s'");
        assert_eq!(escape_arg("", Platform::Unix, None), "''");
    }

    #[test]
    fn windows_replaces_unquotable_characters() {
        assert_eq!(
            escape_arg("50% \"off\"!", Platform::Windows, None),
            "\"50   off  \""
        );
        assert_eq!(
            escape_arg(r"C:\Program Files", Platform::Windows, None),
            "\"C:\\Program Files\""
        );
    }

    #[test]
    fn keys_are_quoted_only_when_needed() {
        assert_eq!(escape_key("--page-size", Platform::Unix, None), "--page-size");
        assert_eq!(escape_key("/tmp/in.html", Platform::Unix, None), "/tmp/in.html");
        assert_eq!(escape_key("not a url", Platform::Unix, None), "'not a url'");
        assert_eq!(escape_key("", Platform::Unix, None), "''");
        assert_eq!(escape_key("--x;y", Platform::Windows, None), "\"--x;y\"");
        assert_eq!(escape_key("100%", Platform::Windows, None), "\"100 \"");
    }

    #[test]
    fn byte_oriented_locale_drops_non_ascii() {
        let c = Locale::new("C");
        assert_eq!(escape_arg("naïve", Platform::Unix, Some(&c)), "'nave'");

        let utf8 = Locale::new("de_DE.UTF-8");
        assert_eq!(escape_arg("naïve", Platform::Unix, Some(&utf8)), "'naïve'");
        assert_eq!(escape_arg("naïve", Platform::Unix, None), "'naïve'");
    }

    #[test]
    fn locale_classification() {
        assert!(Locale::new("C").is_byte_oriented());
        assert!(Locale::new("POSIX").is_byte_oriented());
        assert!(Locale::new("en_US.ISO-8859-1").is_byte_oriented());
        assert!(!Locale::new("C.UTF-8").is_byte_oriented());
        assert!(!Locale::new("en_US.utf8").is_byte_oriented());
        assert!(!Locale::new("en_US").is_byte_oriented());
        assert_eq!(Locale::new("sr_RS.UTF-8@latin").codeset(), Some("UTF-8"));
    }

    #[test]
    fn escape_command_handles_metacharacters() {
        assert_eq!(
            escape_command("tool; rm -rf $HOME", Platform::Unix),
            "tool\\; rm -rf \\$HOME"
        );
        assert_eq!(escape_command("a&b%c", Platform::Windows), "a^&b^%c");
    }

    #[test]
    fn escape_command_leaves_paired_quotes() {
        assert_eq!(
            escape_command("\"/opt/my tool/bin\"", Platform::Unix),
            "\"/opt/my tool/bin\""
        );
        assert_eq!(escape_command("it's", Platform::Unix), "it\\'s");
    }

    proptest! {
        #[test]
        fn unix_escaped_args_are_single_quoted(raw in ".*") {
            let escaped = escape_arg(&raw, Platform::Unix, None);
            prop_assert!(escaped.starts_with('\''));
            prop_assert!(escaped.ends_with('\''));
            // Stripping the quoting scheme yields the original text back.
            let inner = &escaped[1..escaped.len() - 1];
            prop_assert_eq!(inner.replace("'\\''", "'"), raw);
        }

        #[test]
        fn windows_escaped_args_have_no_inner_quotes(raw in ".*") {
            let escaped = escape_arg(&raw, Platform::Windows, None);
            let inner = &escaped[1..escaped.len() - 1];
            prop_assert!(!inner.contains('"'));
            prop_assert!(!inner.contains('%'));
            prop_assert!(!inner.contains('!'));
        }
    }
}
