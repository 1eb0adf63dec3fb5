use std::collections::HashMap;

/// Emoji shortcuts understood out of the box when the config has no `[aliases]` table.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    (":pig:", "🐷"),
    (":sushi:", "🍣"),
    (":heart:", "❤"),
    (":fire:", "🔥"),
    (":smile:", "😄"),
    (":thumbsup:", "👍"),
    (":clap:", "👏"),
    (":pickaxe:", "⛏"),
];

/// Immutable lookup from `:identifier:` tokens to their replacement glyph
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(token, glyph)| (token.into(), glyph.into()))
                .collect(),
        }
    }

    /// The built-in vocabulary
    pub fn builtin() -> Self {
        Self::new(DEFAULT_ALIASES.iter().copied())
    }

    /// Exact, case-sensitive lookup of a full token including its colons.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether `token` has the `:identifier:` shape the sanitizer tokenizes.
pub fn is_alias_token(token: &str) -> bool {
    token
        .strip_prefix(':')
        .and_then(|rest| rest.strip_suffix(':'))
        .map(|ident| !ident.is_empty() && ident.chars().all(crate::sanitize::is_identifier_char))
        .unwrap_or(false)
}
