//! GAV template parsing and rendering
//!
//! Placeholders are written `$name` or `${name}`; `$$` is a literal dollar.
//! A name is a run of ASCII letters, digits and underscores.

use crate::error::{MirrorError, MirrorResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GavTemplate {
    source: String,
    segments: Vec<Segment>,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl GavTemplate {
    pub fn parse(source: &str) -> MirrorResult<Self> {
        let invalid = |at: usize, what: &str| {
            MirrorError::Template(format!("{} at offset {} in [{}]", what, at, source))
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((at, c)) = chars.next() {
            if c != '$' {
                literal.push(c);
                continue;
            }

            let name = match chars.peek().copied() {
                Some((_, '$')) => {
                    chars.next();
                    literal.push('$');
                    continue;
                }
                Some((_, '{')) => {
                    chars.next();
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, c)) if is_name_char(c) => name.push(c),
                            _ => return Err(invalid(at, "Unterminated placeholder")),
                        }
                    }
                    name
                }
                _ => {
                    let mut name = String::new();
                    while let Some((_, c)) = chars.peek().copied().filter(|(_, c)| is_name_char(*c)) {
                        name.push(c);
                        chars.next();
                    }
                    name
                }
            };

            if name.is_empty() {
                return Err(invalid(at, "Invalid placeholder"));
            }
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Placeholder(name));
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Fill every placeholder; a name `lookup` does not know is an error
    pub fn render<F>(&self, lookup: F) -> MirrorResult<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = lookup(name).ok_or_else(|| {
                        MirrorError::Template(format!(
                            "No value for placeholder [{}] in [{}]",
                            name, self.source
                        ))
                    })?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}
