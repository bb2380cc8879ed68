//! Reader for the property-list subset used by sprite sheet metadata.
//!
//! Only the elements found in packed sprite sheet descriptions are
//! understood: `plist`, `dict`, `key`, `array`, `string`, `integer`, `real`
//! and the `true`/`false` tags. Processing instructions, the doctype and
//! comments are skipped.

use thiserror::Error;

/// Value stored in a property list.
#[derive(Clone, Debug, PartialEq)]
pub enum PlistValue {
    /// Ordered dictionary of named values.
    Dict(Vec<(String, PlistValue)>),
    /// Ordered list of values.
    Array(Vec<PlistValue>),
    /// Text value.
    String(String),
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Real(f64),
    /// Boolean flag.
    Bool(bool),
}

impl PlistValue {
    /// Looks up `key` when the value is a dictionary.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PlistValue> {
        match self {
            Self::Dict(entries) => entries
                .iter()
                .find(|(candidate, _)| candidate == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Dictionary entries, if the value is a dictionary.
    #[must_use]
    pub fn as_dict(&self) -> Option<&[(String, PlistValue)]> {
        match self {
            Self::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Text content, if the value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// Boolean content, if the value is a flag.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }
}

/// Errors raised while reading a property list.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlistError {
    /// The document ended inside an element.
    #[error("unexpected end of document")]
    UnexpectedEnd,
    /// An element appeared where another was required.
    #[error("expected {expected}, found `{found}`")]
    UnexpectedTag {
        /// Description of the element that was required.
        expected: &'static str,
        /// Tag that was found instead.
        found: String,
    },
    /// A numeric element held text that is not a number.
    #[error("`{0}` is not a number")]
    InvalidNumber(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TagKind {
    Open,
    Close,
    Empty,
}

#[derive(Debug)]
struct Tag<'a> {
    name: &'a str,
    kind: TagKind,
}

impl Tag<'_> {
    fn describe(&self) -> String {
        match self.kind {
            TagKind::Open => format!("<{}>", self.name),
            TagKind::Close => format!("</{}>", self.name),
            TagKind::Empty => format!("<{}/>", self.name),
        }
    }
}

/// Parses a complete property-list document into its root value.
pub fn parse(document: &str) -> Result<PlistValue, PlistError> {
    let mut reader = Reader {
        input: document,
        position: 0,
    };

    let tag = reader.next_tag()?;
    if tag.name == "plist" && tag.kind == TagKind::Open {
        let root = reader.value()?;
        reader.expect_close("plist")?;
        Ok(root)
    } else {
        reader.value_from(tag)
    }
}

struct Reader<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn skip_markup(&mut self) -> Result<(), PlistError> {
        loop {
            let trimmed = self.rest().trim_start();
            self.position = self.input.len() - trimmed.len();

            let terminator = if trimmed.starts_with("<?") {
                "?>"
            } else if trimmed.starts_with("<!--") {
                "-->"
            } else if trimmed.starts_with("<!") {
                ">"
            } else {
                return Ok(());
            };

            let end = trimmed.find(terminator).ok_or(PlistError::UnexpectedEnd)?;
            self.position += end + terminator.len();
        }
    }

    fn next_tag(&mut self) -> Result<Tag<'a>, PlistError> {
        self.skip_markup()?;
        let rest = self.rest();
        if rest.is_empty() {
            return Err(PlistError::UnexpectedEnd);
        }
        if !rest.starts_with('<') {
            let found = rest.chars().take(16).collect();
            return Err(PlistError::UnexpectedTag {
                expected: "an element",
                found,
            });
        }

        let end = rest.find('>').ok_or(PlistError::UnexpectedEnd)?;
        let body = &rest[1..end];
        self.position += end + 1;

        let (body, kind) = if let Some(name) = body.strip_prefix('/') {
            (name, TagKind::Close)
        } else if let Some(name) = body.strip_suffix('/') {
            (name, TagKind::Empty)
        } else {
            (body, TagKind::Open)
        };
        let name = body.split_whitespace().next().unwrap_or_default();

        Ok(Tag { name, kind })
    }

    fn text(&mut self) -> Result<String, PlistError> {
        let rest = self.rest();
        let end = rest.find('<').ok_or(PlistError::UnexpectedEnd)?;
        self.position += end;
        Ok(decode_entities(&rest[..end]))
    }

    fn expect_close(&mut self, name: &'static str) -> Result<(), PlistError> {
        let tag = self.next_tag()?;
        if tag.kind == TagKind::Close && tag.name == name {
            Ok(())
        } else {
            Err(PlistError::UnexpectedTag {
                expected: name,
                found: tag.describe(),
            })
        }
    }

    fn value(&mut self) -> Result<PlistValue, PlistError> {
        let tag = self.next_tag()?;
        self.value_from(tag)
    }

    fn value_from(&mut self, tag: Tag<'a>) -> Result<PlistValue, PlistError> {
        match (tag.name, tag.kind) {
            ("dict", TagKind::Empty) => Ok(PlistValue::Dict(Vec::new())),
            ("dict", TagKind::Open) => self.dict(),
            ("array", TagKind::Empty) => Ok(PlistValue::Array(Vec::new())),
            ("array", TagKind::Open) => self.array(),
            ("string", TagKind::Empty) => Ok(PlistValue::String(String::new())),
            ("string", TagKind::Open) => {
                let text = self.text()?;
                self.expect_close("string")?;
                Ok(PlistValue::String(text))
            }
            ("integer", TagKind::Open) => {
                let text = self.text()?;
                self.expect_close("integer")?;
                text.trim()
                    .parse()
                    .map(PlistValue::Integer)
                    .map_err(|_| PlistError::InvalidNumber(text))
            }
            ("real", TagKind::Open) => {
                let text = self.text()?;
                self.expect_close("real")?;
                text.trim()
                    .parse()
                    .map(PlistValue::Real)
                    .map_err(|_| PlistError::InvalidNumber(text))
            }
            ("true", TagKind::Empty) => Ok(PlistValue::Bool(true)),
            ("false", TagKind::Empty) => Ok(PlistValue::Bool(false)),
            _ => Err(PlistError::UnexpectedTag {
                expected: "a value element",
                found: tag.describe(),
            }),
        }
    }

    fn dict(&mut self) -> Result<PlistValue, PlistError> {
        let mut entries = Vec::new();
        loop {
            let tag = self.next_tag()?;
            match (tag.name, tag.kind) {
                ("dict", TagKind::Close) => return Ok(PlistValue::Dict(entries)),
                ("key", TagKind::Open) => {
                    let key = self.text()?;
                    self.expect_close("key")?;
                    let value = self.value()?;
                    entries.push((key, value));
                }
                _ => {
                    return Err(PlistError::UnexpectedTag {
                        expected: "<key> or </dict>",
                        found: tag.describe(),
                    })
                }
            }
        }
    }

    fn array(&mut self) -> Result<PlistValue, PlistError> {
        let mut items = Vec::new();
        loop {
            let tag = self.next_tag()?;
            if tag.name == "array" && tag.kind == TagKind::Close {
                return Ok(PlistValue::Array(items));
            }
            items.push(self.value_from(tag)?);
        }
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
