//! Token types emitted by the markup tokenizer.

use core::fmt;

/// An attribute on a start tag token: a name and a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name.
    pub name: String,
    /// Attribute value (empty for valueless attributes).
    pub value: String,
}

impl Attribute {
    /// Create a new attribute with the given name and value.
    #[must_use]
    pub const fn new(name: String, value: String) -> Self {
        Self { name, value }
    }
}

/// The closed set of tokens handed to the tree builder.
///
/// Character data is emitted as whole [`Token::Text`] runs rather than
/// per-character tokens; the tokenizer flushes the accumulated run whenever
/// a tag, comment, or end of input interrupts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A start tag with its name, attributes, and self-closing flag.
    StartTag {
        /// Lowercased tag name.
        name: String,
        /// Attribute list in source order; duplicate names keep the first
        /// occurrence.
        attributes: Vec<Attribute>,
        /// Whether the tag was written `<name ... />`.
        self_closing: bool,
    },
    /// An end tag with its name.
    EndTag {
        /// Lowercased tag name.
        name: String,
    },
    /// A run of character data.
    Text {
        /// The character data.
        data: String,
    },
    /// A comment.
    Comment {
        /// The comment body, excluding the delimiters.
        data: String,
    },
    /// End of the input stream. Emitted exactly once, last.
    EndOfInput,
}

impl Token {
    /// Returns true if this is the end-of-input token.
    #[must_use]
    pub const fn is_end_of_input(&self) -> bool {
        matches!(self, Self::EndOfInput)
    }

    /// The token's tag name, for start and end tags.
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Self::StartTag { name, .. } | Self::EndTag { name } => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                write!(f, "<{name}")?;
                for attr in attributes {
                    write!(f, " {}=\"{}\"", attr.name, attr.value)?;
                }
                if *self_closing {
                    write!(f, " /")?;
                }
                write!(f, ">")
            }
            Self::EndTag { name } => write!(f, "</{name}>"),
            Self::Text { data } => write!(f, "Text({data:?})"),
            Self::Comment { data } => write!(f, "<!--{data}-->"),
            Self::EndOfInput => write!(f, "EndOfInput"),
        }
    }
}
