//! Markup tokenizer state machine.
//!
//! The tokenizer is a lazy iterator: each call to `next()` consumes just
//! enough input to produce the next token. Input can be appended with
//! [`Tokenizer::feed`] while streaming; once the final token
//! ([`Token::EndOfInput`]) has been emitted the sequence is exhausted and
//! cannot be restarted — each character is tokenized exactly once.

use std::collections::VecDeque;

use strum_macros::Display;
use wren_common::warning::warn_once;

use super::token::{Attribute, Token};

/// Elements whose content is consumed verbatim until the literal matching
/// end tag; markup inside them is never tokenized.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "title", "textarea"];

/// The tokenizer state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenizerState {
    /// Between tags, accumulating character data.
    Data,
    /// Just consumed `<`.
    TagOpen,
    /// Just consumed `</`.
    EndTagOpen,
    /// Inside a tag name.
    TagName,
    /// Whitespace inside a tag, before an attribute name.
    BeforeAttributeName,
    /// Inside an attribute name.
    AttributeName,
    /// After an attribute name, before `=` or the next attribute.
    AfterAttributeName,
    /// Just consumed `=`, before the attribute value.
    BeforeAttributeValue,
    /// Inside a double-quoted attribute value.
    AttributeValueDoubleQuoted,
    /// Inside a single-quoted attribute value.
    AttributeValueSingleQuoted,
    /// Inside an unquoted attribute value.
    AttributeValueUnquoted,
    /// Just consumed the closing quote of an attribute value.
    AfterAttributeValueQuoted,
    /// Just consumed `/` before a (potential) `>`.
    SelfClosingStartTag,
    /// Just consumed `<!`.
    MarkupDeclarationOpen,
    /// Discarding a bogus markup declaration (doctype, CDATA, …) to `>`.
    BogusMarkup,
    /// Inside a comment body.
    Comment,
    /// Consumed one `-` inside a comment.
    CommentEndDash,
    /// Consumed `--` inside a comment.
    CommentEnd,
    /// Inside raw-text element content.
    RawText,
    /// Consumed `<` inside raw text.
    RawTextLessThan,
    /// Consumed `</` inside raw text.
    RawTextEndTagOpen,
    /// Accumulating a candidate end tag name inside raw text.
    RawTextEndTagName,
    /// Matched the raw-text end tag name; discarding to `>`.
    RawTextEndTagRest,
    /// Malformed input: discarding to the next `<` and resuming.
    Resync,
}

/// The markup tokenizer.
///
/// Construct with [`Tokenizer::new`] for a complete input, or
/// [`Tokenizer::streaming`] + [`Tokenizer::feed`] + [`Tokenizer::finish`]
/// when input arrives incrementally. Malformed input is never fatal: states
/// with no defined transition resynchronize by discarding to the next `<`.
pub struct Tokenizer {
    state: TokenizerState,
    input: Vec<char>,
    pos: usize,
    /// No further `feed` calls will arrive; exhaustion of `input` is EOF.
    complete: bool,
    emitted_eof: bool,

    /// Pending character-data run, flushed as one `Text` token.
    text_buffer: String,
    tag_name: String,
    tag_is_end: bool,
    tag_self_closing: bool,
    attributes: Vec<Attribute>,
    attr_name: String,
    attr_value: String,
    comment_buffer: String,

    /// Name of the open raw-text element, if the tokenizer is in raw-text
    /// mode; its literal end tag is the only exit.
    raw_text_tag: Option<String>,
    raw_buffer: String,
    /// Candidate end tag name while scanning `</...` in raw text.
    temp_buffer: String,

    /// Tokens produced but not yet handed out.
    pending: VecDeque<Token>,
}

impl Tokenizer {
    /// Create a tokenizer over a complete input string.
    #[must_use]
    pub fn new(input: &str) -> Self {
        let mut tokenizer = Self::streaming();
        tokenizer.feed(input);
        tokenizer.finish();
        tokenizer
    }

    /// Create an empty tokenizer that expects input via [`feed`](Self::feed).
    #[must_use]
    pub fn streaming() -> Self {
        Self {
            state: TokenizerState::Data,
            input: Vec::new(),
            pos: 0,
            complete: false,
            emitted_eof: false,
            text_buffer: String::new(),
            tag_name: String::new(),
            tag_is_end: false,
            tag_self_closing: false,
            attributes: Vec::new(),
            attr_name: String::new(),
            attr_value: String::new(),
            comment_buffer: String::new(),
            raw_text_tag: None,
            raw_buffer: String::new(),
            temp_buffer: String::new(),
            pending: VecDeque::new(),
        }
    }

    /// Append input. Ignored once the end-of-input token has been emitted.
    pub fn feed(&mut self, text: &str) {
        if !self.emitted_eof {
            self.input.extend(text.chars());
        }
    }

    /// Declare the input complete; the tokenizer will emit
    /// [`Token::EndOfInput`] when it exhausts the buffered characters.
    pub fn finish(&mut self) {
        self.complete = true;
    }

    /// Whether the final token has been emitted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.emitted_eof
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn flush_text(&mut self) {
        if !self.text_buffer.is_empty() {
            self.pending.push_back(Token::Text {
                data: std::mem::take(&mut self.text_buffer),
            });
        }
    }

    fn begin_tag(&mut self, is_end: bool) {
        self.tag_name.clear();
        self.tag_is_end = is_end;
        self.tag_self_closing = false;
        self.attributes.clear();
        self.attr_name.clear();
        self.attr_value.clear();
    }

    /// Commit the attribute under construction. Duplicate names keep the
    /// first occurrence.
    fn commit_attribute(&mut self) {
        if self.attr_name.is_empty() {
            return;
        }
        let name = std::mem::take(&mut self.attr_name);
        let value = std::mem::take(&mut self.attr_value);
        if self.attributes.iter().any(|a| a.name == name) {
            warn_once("HTML", &format!("duplicate attribute '{name}' dropped"));
        } else {
            self.attributes.push(Attribute::new(name, value));
        }
    }

    /// Emit the tag under construction and pick the follow state, switching
    /// into raw-text mode for raw-text start tags.
    fn emit_tag(&mut self) {
        self.commit_attribute();
        let name = std::mem::take(&mut self.tag_name);
        if self.tag_is_end {
            self.pending.push_back(Token::EndTag { name });
            self.state = TokenizerState::Data;
            return;
        }

        let enters_raw_text =
            !self.tag_self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str());
        self.pending.push_back(Token::StartTag {
            name: name.clone(),
            attributes: std::mem::take(&mut self.attributes),
            self_closing: self.tag_self_closing,
        });
        if enters_raw_text {
            self.raw_text_tag = Some(name);
            self.raw_buffer.clear();
            self.state = TokenizerState::RawText;
        } else {
            self.state = TokenizerState::Data;
        }
    }

    fn flush_raw_text(&mut self) {
        if !self.raw_buffer.is_empty() {
            self.pending.push_back(Token::Text {
                data: std::mem::take(&mut self.raw_buffer),
            });
        }
    }

    /// Leave raw-text mode through its matching end tag.
    fn finish_raw_text(&mut self) {
        self.flush_raw_text();
        if let Some(tag) = self.raw_text_tag.take() {
            self.pending.push_back(Token::EndTag { name: tag });
        }
        self.state = TokenizerState::Data;
    }

    fn emit_eof(&mut self) {
        self.flush_text();
        self.flush_raw_text();
        if let Some(comment) = self.take_unterminated_comment() {
            self.pending.push_back(comment);
        }
        self.pending.push_back(Token::EndOfInput);
        self.emitted_eof = true;
    }

    fn take_unterminated_comment(&mut self) -> Option<Token> {
        if matches!(
            self.state,
            TokenizerState::Comment | TokenizerState::CommentEndDash | TokenizerState::CommentEnd
        ) {
            warn_once("HTML", "unterminated comment at end of input");
            return Some(Token::Comment {
                data: std::mem::take(&mut self.comment_buffer),
            });
        }
        None
    }

    fn resync(&mut self, context: &str) {
        warn_once(
            "HTML",
            &format!("malformed markup in {context}; resynchronizing at next '<'"),
        );
        self.state = TokenizerState::Resync;
    }

    const fn is_whitespace(c: char) -> bool {
        matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{0C}')
    }

    /// Run one state-machine step. Returns `false` when starved (streaming
    /// input exhausted but not yet complete).
    #[allow(clippy::too_many_lines, reason = "one arm per tokenizer state")]
    fn step(&mut self) -> bool {
        let c = if self.pos < self.input.len() {
            Some(self.input[self.pos])
        } else if self.complete {
            None
        } else {
            return false;
        };

        match self.state {
            TokenizerState::Data => match c {
                Some('<') => {
                    self.advance();
                    self.flush_text();
                    self.state = TokenizerState::TagOpen;
                }
                Some(ch) => {
                    self.advance();
                    self.text_buffer.push(ch);
                }
                None => self.emit_eof(),
            },

            TokenizerState::TagOpen => match c {
                Some('/') => {
                    self.advance();
                    self.state = TokenizerState::EndTagOpen;
                }
                Some('!') => {
                    self.advance();
                    self.state = TokenizerState::MarkupDeclarationOpen;
                }
                Some(ch) if ch.is_ascii_alphabetic() => {
                    self.begin_tag(false);
                    self.state = TokenizerState::TagName;
                }
                Some(_) => self.resync("tag open"),
                None => self.emit_eof(),
            },

            TokenizerState::EndTagOpen => match c {
                Some(ch) if ch.is_ascii_alphabetic() => {
                    self.begin_tag(true);
                    self.state = TokenizerState::TagName;
                }
                Some('>') => {
                    self.advance();
                    warn_once("HTML", "empty end tag '</>' dropped");
                    self.state = TokenizerState::Data;
                }
                Some(_) => self.resync("end tag open"),
                None => self.emit_eof(),
            },

            TokenizerState::TagName => match c {
                Some(ch) if Self::is_whitespace(ch) => {
                    self.advance();
                    self.state = TokenizerState::BeforeAttributeName;
                }
                Some('/') => {
                    self.advance();
                    self.state = TokenizerState::SelfClosingStartTag;
                }
                Some('>') => {
                    self.advance();
                    self.emit_tag();
                }
                Some(ch) => {
                    self.advance();
                    self.tag_name.push(ch.to_ascii_lowercase());
                }
                None => {
                    warn_once("HTML", "unterminated tag at end of input dropped");
                    self.emit_eof();
                }
            },

            TokenizerState::BeforeAttributeName => match c {
                Some(ch) if Self::is_whitespace(ch) => self.advance(),
                Some('/') => {
                    self.advance();
                    self.state = TokenizerState::SelfClosingStartTag;
                }
                Some('>') => {
                    self.advance();
                    self.emit_tag();
                }
                Some('=') => {
                    warn_once("HTML", "unexpected '=' before attribute name");
                    self.advance();
                }
                Some(_) => {
                    self.attr_name.clear();
                    self.attr_value.clear();
                    self.state = TokenizerState::AttributeName;
                }
                None => {
                    warn_once("HTML", "unterminated tag at end of input dropped");
                    self.emit_eof();
                }
            },

            TokenizerState::AttributeName => match c {
                Some(ch) if Self::is_whitespace(ch) => {
                    self.advance();
                    self.state = TokenizerState::AfterAttributeName;
                }
                Some('=') => {
                    self.advance();
                    self.state = TokenizerState::BeforeAttributeValue;
                }
                Some('/') => {
                    self.advance();
                    self.commit_attribute();
                    self.state = TokenizerState::SelfClosingStartTag;
                }
                Some('>') => {
                    self.advance();
                    self.emit_tag();
                }
                Some(ch) => {
                    self.advance();
                    self.attr_name.push(ch.to_ascii_lowercase());
                }
                None => {
                    warn_once("HTML", "unterminated tag at end of input dropped");
                    self.emit_eof();
                }
            },

            TokenizerState::AfterAttributeName => match c {
                Some(ch) if Self::is_whitespace(ch) => self.advance(),
                Some('=') => {
                    self.advance();
                    self.state = TokenizerState::BeforeAttributeValue;
                }
                Some('/') => {
                    self.advance();
                    self.commit_attribute();
                    self.state = TokenizerState::SelfClosingStartTag;
                }
                Some('>') => {
                    self.advance();
                    self.emit_tag();
                }
                Some(_) => {
                    // Valueless attribute followed by another attribute.
                    self.commit_attribute();
                    self.state = TokenizerState::AttributeName;
                }
                None => {
                    warn_once("HTML", "unterminated tag at end of input dropped");
                    self.emit_eof();
                }
            },

            TokenizerState::BeforeAttributeValue => match c {
                Some(ch) if Self::is_whitespace(ch) => self.advance(),
                Some('"') => {
                    self.advance();
                    self.state = TokenizerState::AttributeValueDoubleQuoted;
                }
                Some('\'') => {
                    self.advance();
                    self.state = TokenizerState::AttributeValueSingleQuoted;
                }
                Some('>') => {
                    warn_once("HTML", "attribute with '=' but no value");
                    self.advance();
                    self.emit_tag();
                }
                Some(_) => self.state = TokenizerState::AttributeValueUnquoted,
                None => {
                    warn_once("HTML", "unterminated tag at end of input dropped");
                    self.emit_eof();
                }
            },

            TokenizerState::AttributeValueDoubleQuoted => match c {
                Some('"') => {
                    self.advance();
                    self.commit_attribute();
                    self.state = TokenizerState::AfterAttributeValueQuoted;
                }
                Some(ch) => {
                    self.advance();
                    self.attr_value.push(ch);
                }
                None => {
                    warn_once("HTML", "unterminated attribute value at end of input");
                    self.emit_eof();
                }
            },

            TokenizerState::AttributeValueSingleQuoted => match c {
                Some('\'') => {
                    self.advance();
                    self.commit_attribute();
                    self.state = TokenizerState::AfterAttributeValueQuoted;
                }
                Some(ch) => {
                    self.advance();
                    self.attr_value.push(ch);
                }
                None => {
                    warn_once("HTML", "unterminated attribute value at end of input");
                    self.emit_eof();
                }
            },

            TokenizerState::AttributeValueUnquoted => match c {
                Some(ch) if Self::is_whitespace(ch) => {
                    self.advance();
                    self.commit_attribute();
                    self.state = TokenizerState::BeforeAttributeName;
                }
                Some('>') => {
                    self.advance();
                    self.commit_attribute();
                    self.emit_tag();
                }
                Some(ch) => {
                    self.advance();
                    self.attr_value.push(ch);
                }
                None => {
                    warn_once("HTML", "unterminated tag at end of input dropped");
                    self.emit_eof();
                }
            },

            TokenizerState::AfterAttributeValueQuoted => match c {
                Some(ch) if Self::is_whitespace(ch) => {
                    self.advance();
                    self.state = TokenizerState::BeforeAttributeName;
                }
                Some('/') => {
                    self.advance();
                    self.state = TokenizerState::SelfClosingStartTag;
                }
                Some('>') => {
                    self.advance();
                    self.emit_tag();
                }
                Some(_) => {
                    warn_once("HTML", "missing whitespace between attributes");
                    self.state = TokenizerState::BeforeAttributeName;
                }
                None => {
                    warn_once("HTML", "unterminated tag at end of input dropped");
                    self.emit_eof();
                }
            },

            TokenizerState::SelfClosingStartTag => match c {
                Some('>') => {
                    self.advance();
                    self.tag_self_closing = !self.tag_is_end;
                    self.emit_tag();
                }
                Some(_) => {
                    warn_once("HTML", "unexpected character after '/' in tag");
                    self.state = TokenizerState::BeforeAttributeName;
                }
                None => {
                    warn_once("HTML", "unterminated tag at end of input dropped");
                    self.emit_eof();
                }
            },

            TokenizerState::MarkupDeclarationOpen => {
                let remaining = self.input.len() - self.pos;
                if remaining >= 2 {
                    if self.input[self.pos] == '-' && self.input[self.pos + 1] == '-' {
                        self.pos += 2;
                        self.comment_buffer.clear();
                        self.state = TokenizerState::Comment;
                    } else {
                        // Doctype and other declarations are not represented
                        // in the tree; skip to the closing '>'.
                        self.state = TokenizerState::BogusMarkup;
                    }
                } else if self.complete {
                    match c {
                        Some(_) => self.state = TokenizerState::BogusMarkup,
                        None => self.emit_eof(),
                    }
                } else {
                    // Streaming: not enough lookahead yet.
                    return false;
                }
            }

            TokenizerState::BogusMarkup => match c {
                Some('>') => {
                    self.advance();
                    self.state = TokenizerState::Data;
                }
                Some(_) => self.advance(),
                None => self.emit_eof(),
            },

            TokenizerState::Comment => match c {
                Some('-') => {
                    self.advance();
                    self.state = TokenizerState::CommentEndDash;
                }
                Some(ch) => {
                    self.advance();
                    self.comment_buffer.push(ch);
                }
                None => self.emit_eof(),
            },

            TokenizerState::CommentEndDash => match c {
                Some('-') => {
                    self.advance();
                    self.state = TokenizerState::CommentEnd;
                }
                Some(ch) => {
                    self.advance();
                    self.comment_buffer.push('-');
                    self.comment_buffer.push(ch);
                    self.state = TokenizerState::Comment;
                }
                None => self.emit_eof(),
            },

            TokenizerState::CommentEnd => match c {
                Some('>') => {
                    self.advance();
                    self.pending.push_back(Token::Comment {
                        data: std::mem::take(&mut self.comment_buffer),
                    });
                    self.state = TokenizerState::Data;
                }
                Some('-') => {
                    self.advance();
                    self.comment_buffer.push('-');
                }
                Some(ch) => {
                    self.advance();
                    self.comment_buffer.push_str("--");
                    self.comment_buffer.push(ch);
                    self.state = TokenizerState::Comment;
                }
                None => self.emit_eof(),
            },

            TokenizerState::RawText => match c {
                Some('<') => {
                    self.advance();
                    self.state = TokenizerState::RawTextLessThan;
                }
                Some(ch) => {
                    self.advance();
                    self.raw_buffer.push(ch);
                }
                None => {
                    warn_once("HTML", "unterminated raw-text element at end of input");
                    self.emit_eof();
                }
            },

            TokenizerState::RawTextLessThan => match c {
                Some('/') => {
                    self.advance();
                    self.temp_buffer.clear();
                    self.state = TokenizerState::RawTextEndTagOpen;
                }
                _ => {
                    self.raw_buffer.push('<');
                    self.state = TokenizerState::RawText;
                }
            },

            TokenizerState::RawTextEndTagOpen => match c {
                Some(ch) if ch.is_ascii_alphabetic() => {
                    self.state = TokenizerState::RawTextEndTagName;
                }
                _ => {
                    self.raw_buffer.push_str("</");
                    self.state = TokenizerState::RawText;
                }
            },

            TokenizerState::RawTextEndTagName => {
                let matches_open_tag = self
                    .raw_text_tag
                    .as_deref()
                    .is_some_and(|tag| tag.eq_ignore_ascii_case(&self.temp_buffer));
                match c {
                    Some(ch) if ch.is_ascii_alphabetic() => {
                        self.advance();
                        self.temp_buffer.push(ch.to_ascii_lowercase());
                    }
                    Some('>') if matches_open_tag => {
                        self.advance();
                        self.finish_raw_text();
                    }
                    Some(ch) if Self::is_whitespace(ch) && matches_open_tag => {
                        self.advance();
                        self.state = TokenizerState::RawTextEndTagRest;
                    }
                    _ => {
                        // Not the matching end tag: the whole run is content.
                        self.raw_buffer.push_str("</");
                        let candidate = std::mem::take(&mut self.temp_buffer);
                        self.raw_buffer.push_str(&candidate);
                        self.state = TokenizerState::RawText;
                    }
                }
            }

            TokenizerState::RawTextEndTagRest => match c {
                Some('>') => {
                    self.advance();
                    self.finish_raw_text();
                }
                Some(_) => self.advance(),
                None => {
                    warn_once("HTML", "unterminated raw-text element at end of input");
                    self.emit_eof();
                }
            },

            TokenizerState::Resync => match c {
                Some('<') => {
                    self.advance();
                    self.state = TokenizerState::TagOpen;
                }
                Some(_) => self.advance(),
                None => self.emit_eof(),
            },
        }
        true
    }
}

impl Iterator for Tokenizer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.emitted_eof || !self.step() {
                return None;
            }
        }
    }
}
