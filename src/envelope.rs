use std::fmt;

use crate::sanitize::SanitizedText;

/// Source tag identifying where a relayed message came from.
pub const SOURCE_TAG: &str = "YouTube";

/// A chat line ready to be shown on the server console.
///
/// Serializes as `{from:"YouTube",name:"<sender>",text:["<text>"]}`. Neither
/// field is escaped: the text is quote-free by construction and the sender name
/// is expected to be vetted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    from: &'static str,
    name: String,
    text: Vec<SanitizedText>,
}

impl Envelope {
    pub fn new(sender_name: impl Into<String>, text: SanitizedText) -> Self {
        Self {
            from: SOURCE_TAG,
            name: sender_name.into(),
            text: vec![text],
        }
    }

    /// Build an envelope from the sanitizer's output; a rejected message yields `None`.
    pub fn build(sender_name: &str, sanitized: Option<SanitizedText>) -> Option<Self> {
        sanitized.map(|text| Self::new(sender_name, text))
    }

    pub fn sender_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{from:\"{}\",name:\"{}\",text:[", self.from, self.name)?;
        for (i, text) in self.text.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "\"{}\"", text)?;
        }
        f.write_str("]}")
    }
}
