//! `{id}` placeholder templates for remote URLs and local filenames.
//!
//! Supported placeholders:
//! - `{id}`: the decimal id, e.g. `7`
//! - `{id:0N}`: the id zero-padded to N digits, e.g. `{id:03}` → `007`

use std::fmt::Write as _;

use super::TemplateError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Id { width: usize },
}

/// A parsed template with at least one id placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdTemplate {
    source: String,
    parts: Vec<Part>,
}

impl IdTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| TemplateError::Unclosed(template.to_string()))?;
            let inner = &after[..close];
            let width = parse_placeholder(inner).ok_or_else(|| TemplateError::UnknownPlaceholder {
                template: template.to_string(),
                placeholder: inner.to_string(),
            })?;
            if !literal.is_empty() {
                parts.push(Part::Literal(std::mem::take(&mut literal)));
            }
            parts.push(Part::Id { width });
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        if !parts.iter().any(|p| matches!(p, Part::Id { .. })) {
            return Err(TemplateError::MissingId(template.to_string()));
        }
        Ok(Self {
            source: template.to_string(),
            parts,
        })
    }

    /// Substitutes `id` into every placeholder.
    pub fn render(&self, id: u32) -> String {
        let mut out = String::with_capacity(self.source.len() + 8);
        for part in &self.parts {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Id { width } => {
                    let _ = write!(out, "{:0width$}", id, width = *width);
                }
            }
        }
        out
    }

    /// The literal text between placeholders.
    pub(super) fn literals(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            Part::Literal(s) => Some(s.as_str()),
            Part::Id { .. } => None,
        })
    }
}

/// Returns the zero-pad width for `id` (0) or `id:0N` (N); None for anything else.
fn parse_placeholder(inner: &str) -> Option<usize> {
    if inner == "id" {
        return Some(0);
    }
    let digits = inner.strip_prefix("id:0")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_id() {
        let t = IdTemplate::parse("https://cdn.example.com/pages/{id}.png").unwrap();
        assert_eq!(t.render(1), "https://cdn.example.com/pages/1.png");
        assert_eq!(t.render(604), "https://cdn.example.com/pages/604.png");
    }

    #[test]
    fn padded_id() {
        let t = IdTemplate::parse("page-{id:03}.png").unwrap();
        assert_eq!(t.render(7), "page-007.png");
        assert_eq!(t.render(604), "page-604.png");
        assert_eq!(t.render(1234), "page-1234.png");
    }

    #[test]
    fn repeated_placeholder() {
        let t = IdTemplate::parse("{id}/{id:02}").unwrap();
        assert_eq!(t.render(3), "3/03");
    }

    #[test]
    fn missing_id_rejected() {
        assert!(matches!(
            IdTemplate::parse("static.png"),
            Err(TemplateError::MissingId(_))
        ));
    }

    #[test]
    fn unknown_placeholder_rejected() {
        assert!(matches!(
            IdTemplate::parse("{page}.png"),
            Err(TemplateError::UnknownPlaceholder { .. })
        ));
        assert!(matches!(
            IdTemplate::parse("{id:3}.png"),
            Err(TemplateError::UnknownPlaceholder { .. })
        ));
        assert!(matches!(
            IdTemplate::parse("{id:0}.png"),
            Err(TemplateError::UnknownPlaceholder { .. })
        ));
    }

    #[test]
    fn unclosed_rejected() {
        assert!(matches!(
            IdTemplate::parse("{id.png"),
            Err(TemplateError::Unclosed(_))
        ));
    }
}
