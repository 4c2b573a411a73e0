#![forbid(unsafe_code)]

//! Minimal CSS selector engine.
//!
//! Supports comma-separated lists of compound selectors. A compound selector
//! is an optional type selector (`a`, `div`, `*`) followed by any number of
//! `#id`, `.class`, `[attr]` and `[attr=value]` parts (values may be bare or
//! quoted with `'` / `"`). Combinators are not supported.
//!
//! # Failure Modes
//!
//! | Input | Error |
//! |-------|-------|
//! | `""`, `"   "` | [`SelectorError::Empty`] |
//! | `"a,"` | [`SelectorError::UnexpectedEnd`] |
//! | `"div > p"` | [`SelectorError::UnexpectedChar`] |
//! | `"[href"` | [`SelectorError::UnterminatedAttribute`] |
//! | `"[href=\"#x]"` | [`SelectorError::UnterminatedString`] |
//! | `"#"`, `".x."` | [`SelectorError::EmptyName`] |

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Errors from selector parsing. Positions are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// The selector was blank.
    Empty,
    /// Input ended where a compound selector was expected.
    UnexpectedEnd,
    /// A character that cannot start or continue a selector part.
    UnexpectedChar { pos: usize, found: char },
    /// `[` without a closing `]`.
    UnterminatedAttribute { pos: usize },
    /// Quoted attribute value without its closing quote.
    UnterminatedString { pos: usize },
    /// `#`, `.` or `[` not followed by a name.
    EmptyName { pos: usize },
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty selector"),
            Self::UnexpectedEnd => write!(f, "unexpected end of selector"),
            Self::UnexpectedChar { pos, found } => {
                write!(f, "unexpected character '{found}' at offset {pos}")
            }
            Self::UnterminatedAttribute { pos } => {
                write!(f, "unterminated attribute selector starting at offset {pos}")
            }
            Self::UnterminatedString { pos } => {
                write!(f, "unterminated string starting at offset {pos}")
            }
            Self::EmptyName { pos } => write!(f, "expected a name at offset {pos}"),
        }
    }
}

impl std::error::Error for SelectorError {}

/// Read access a selector needs from an element.
pub trait SelectorTarget {
    /// Lower-case tag name.
    fn tag_name(&self) -> &str;
    /// Attribute value, if the attribute is present.
    fn attribute_value(&self, name: &str) -> Option<Cow<'_, str>>;
    fn has_class(&self, class: &str) -> bool;
}

/// `[name]` or `[name=value]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub value: Option<String>,
}

/// One compound selector, e.g. `a.button[href="#m1"]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
}

impl CompoundSelector {
    /// A selector matching every element (`*`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a tag name.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into().to_ascii_lowercase());
        self
    }

    /// Require an `id`.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Require a class.
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Require an attribute to be present.
    #[must_use]
    pub fn has_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(AttributeSelector {
            name: name.into().to_ascii_lowercase(),
            value: None,
        });
        self
    }

    /// Require an attribute to equal `value` exactly.
    #[must_use]
    pub fn attribute_equals(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(AttributeSelector {
            name: name.into().to_ascii_lowercase(),
            value: Some(value.into()),
        });
        self
    }

    pub fn matches<T: SelectorTarget + ?Sized>(&self, el: &T) -> bool {
        if let Some(tag) = &self.tag
            && tag != el.tag_name()
        {
            return false;
        }
        if let Some(id) = &self.id
            && el.attribute_value("id").as_deref() != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attributes
            .iter()
            .all(|attr| match (el.attribute_value(&attr.name), &attr.value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected.as_str(),
            })
    }

    fn is_universal(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        } else if self.is_universal() {
            f.write_str("*")?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for attr in &self.attributes {
            match &attr.value {
                None => write!(f, "[{}]", attr.name)?,
                Some(value) => {
                    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                    write!(f, "[{}=\"{escaped}\"]", attr.name)?;
                }
            }
        }
        Ok(())
    }
}

/// A comma-separated selector list; matches when any member matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<CompoundSelector>,
}

impl SelectorList {
    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser::new(input).parse_list()
    }

    /// A list holding a single compound selector.
    pub fn single(selector: CompoundSelector) -> Self {
        Self {
            selectors: vec![selector],
        }
    }

    /// Append another alternative.
    #[must_use]
    pub fn or(mut self, selector: CompoundSelector) -> Self {
        self.selectors.push(selector);
        self
    }

    pub fn selectors(&self) -> &[CompoundSelector] {
        &self.selectors
    }

    pub fn matches<T: SelectorTarget + ?Sized>(&self, el: &T) -> bool {
        self.selectors.iter().any(|s| s.matches(el))
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn name(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        if self.pos == start {
            return Err(SelectorError::EmptyName { pos: start });
        }
        Ok(self.input[start..self.pos].to_owned())
    }

    fn parse_list(&mut self) -> Result<SelectorList, SelectorError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(SelectorError::Empty);
        }
        let mut selectors = Vec::new();
        loop {
            selectors.push(self.parse_compound()?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => {
                    self.bump();
                    self.skip_ws();
                }
                Some(found) => {
                    return Err(SelectorError::UnexpectedChar {
                        pos: self.pos,
                        found,
                    });
                }
            }
        }
        Ok(SelectorList { selectors })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut selector = CompoundSelector::new();
        let mut parts = 0usize;

        match self.peek() {
            None => return Err(SelectorError::UnexpectedEnd),
            Some('*') => {
                self.bump();
                parts += 1;
            }
            Some(c) if is_name_char(c) => {
                selector.tag = Some(self.name()?.to_ascii_lowercase());
                parts += 1;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    selector.id = Some(self.name()?);
                }
                Some('.') => {
                    self.bump();
                    let class = self.name()?;
                    selector.classes.push(class);
                }
                Some('[') => {
                    let attr = self.parse_attribute()?;
                    selector.attributes.push(attr);
                }
                _ => break,
            }
            parts += 1;
        }

        if parts == 0 {
            return match self.peek() {
                Some(found) => Err(SelectorError::UnexpectedChar {
                    pos: self.pos,
                    found,
                }),
                None => Err(SelectorError::UnexpectedEnd),
            };
        }
        Ok(selector)
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        let open = self.pos;
        self.bump();
        self.skip_ws();
        let name = self.name()?.to_ascii_lowercase();
        self.skip_ws();
        let value = match self.bump() {
            Some(']') => return Ok(AttributeSelector { name, value: None }),
            Some('=') => {
                self.skip_ws();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => self.quoted(quote)?,
                    Some(_) => self.name()?,
                    None => return Err(SelectorError::UnterminatedAttribute { pos: open }),
                };
                self.skip_ws();
                value
            }
            Some(found) => {
                return Err(SelectorError::UnexpectedChar {
                    pos: self.pos - found.len_utf8(),
                    found,
                });
            }
            None => return Err(SelectorError::UnterminatedAttribute { pos: open }),
        };
        match self.bump() {
            Some(']') => Ok(AttributeSelector {
                name,
                value: Some(value),
            }),
            _ => Err(SelectorError::UnterminatedAttribute { pos: open }),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SelectorError::UnterminatedString { pos: start }),
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => return Err(SelectorError::UnterminatedString { pos: start }),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }
}
