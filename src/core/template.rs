/// Slot templates — parsing and rendering of the prose pools.
///
/// A template is literal text with `{slot}` references that are filled from
/// a `Slots` table at render time. `{{` and `}}` escape literal braces.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template parse error: {0}")]
    Parse(String),
    #[error("unknown template slot: {0}")]
    UnknownSlot(String),
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// Reference to a named value: `{slot}`.
    Slot(String),
}

/// A parsed template — a sequence of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub segments: Vec<TemplateSegment>,
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{slot_name}` → `Slot`
    /// - `{{` / `}}` → literal brace
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            if chars[i] == '{' {
                // Escaped brace
                if i + 1 < len && chars[i + 1] == '{' {
                    literal_buf.push('{');
                    i += 2;
                    continue;
                }

                if !literal_buf.is_empty() {
                    segments.push(TemplateSegment::Literal(std::mem::take(&mut literal_buf)));
                }

                let start = i + 1;
                let mut end = start;
                let mut closed = false;
                while end < len {
                    if chars[end] == '{' {
                        return Err(TemplateError::Parse(
                            "nested braces are not allowed".to_string(),
                        ));
                    }
                    if chars[end] == '}' {
                        closed = true;
                        break;
                    }
                    end += 1;
                }

                if !closed {
                    return Err(TemplateError::Parse("unclosed brace".to_string()));
                }

                let name: String = chars[start..end].iter().collect();
                let name = name.trim();
                if name.is_empty() {
                    return Err(TemplateError::Parse("empty braces".to_string()));
                }
                if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(TemplateError::Parse(format!(
                        "invalid slot name '{}'",
                        name
                    )));
                }

                segments.push(TemplateSegment::Slot(name.to_string()));
                i = end + 1;
            } else if chars[i] == '}' {
                if i + 1 < len && chars[i + 1] == '}' {
                    literal_buf.push('}');
                    i += 2;
                    continue;
                }
                return Err(TemplateError::Parse(
                    "unmatched closing brace".to_string(),
                ));
            } else {
                literal_buf.push(chars[i]);
                i += 1;
            }
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        Ok(Template { segments })
    }

    /// Names of every slot this template references, in order.
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match seg {
            TemplateSegment::Slot(name) => Some(name.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }

    /// Fill every slot from `slots`. A slot missing from the table is an error.
    pub fn render(&self, slots: &Slots) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Slot(name) => {
                    let value = slots
                        .get(name)
                        .ok_or_else(|| TemplateError::UnknownSlot(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// Named values available to a template render.
#[derive(Debug, Clone, Default)]
pub struct Slots {
    values: FxHashMap<String, String>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

/// Parse and render in one step.
pub fn render(source: &str, slots: &Slots) -> Result<String, TemplateError> {
    Template::parse(source)?.render(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("Hello, world.").unwrap();
        assert_eq!(
            t.segments,
            vec![TemplateSegment::Literal("Hello, world.".to_string())]
        );
    }

    #[test]
    fn parse_slot() {
        let t = Template::parse("In a {world_setting} world.").unwrap();
        assert_eq!(t.segments.len(), 3);
        assert_eq!(
            t.segments[1],
            TemplateSegment::Slot("world_setting".to_string())
        );
    }

    #[test]
    fn parse_escaped_braces() {
        let t = Template::parse("Use {{braces}} here.").unwrap();
        assert_eq!(
            t.segments,
            vec![TemplateSegment::Literal("Use {braces} here.".to_string())]
        );
    }

    #[test]
    fn parse_errors() {
        assert!(Template::parse("Bad {} here").is_err());
        assert!(Template::parse("Bad {outer{inner}} here").is_err());
        assert!(Template::parse("Bad {unclosed here").is_err());
        assert!(Template::parse("Bad } here").is_err());
        assert!(Template::parse("Bad {two words} here").is_err());
    }

    #[test]
    fn slot_names_in_order() {
        let t = Template::parse("{a} then {b} then {a}").unwrap();
        let names: Vec<&str> = t.slot_names().collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn render_fills_slots() {
        let slots = Slots::new()
            .with("protagonist", "The Antihero")
            .with("motif", "Revenge");
        let out = render("{protagonist} wants {motif}.", &slots).unwrap();
        assert_eq!(out, "The Antihero wants Revenge.");
    }

    #[test]
    fn render_unknown_slot_is_error() {
        let slots = Slots::new().with("a", "x");
        let err = render("{a} and {b}", &slots).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownSlot(name) if name == "b"));
    }
}
