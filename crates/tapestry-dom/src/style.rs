//! Inline `style` attribute handling.

use std::fmt;

use smol_str::SmolStr;

/// Parsed inline style, preserving declaration order.
///
/// Property names are stored lowercase in kebab-case. Serialization produces
/// `name: value;` pairs joined by single spaces, which is what browsers emit
/// for `element.style.cssText`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleDeclaration {
    decls: Vec<(SmolStr, String)>,
}

impl StyleDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(source: &str) -> Self {
        let mut style = Self::new();
        for decl in split_declarations(source) {
            let Some((name, value)) = decl.split_once(':') else {
                continue;
            };
            style.set(name, value);
        }
        style
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        let property = normalize_name(property);
        self.decls
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value.as_str())
    }

    /// Sets a property. An empty value removes it.
    pub fn set(&mut self, property: &str, value: &str) {
        let property = normalize_name(property);
        let value = value.trim();
        if property.is_empty() {
            return;
        }
        if value.is_empty() {
            self.remove(&property);
            return;
        }
        match self.decls.iter_mut().find(|(name, _)| *name == property) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.decls.push((property, value.to_string())),
        }
    }

    /// Removes a property, returning its previous value.
    pub fn remove(&mut self, property: &str) -> Option<String> {
        let property = normalize_name(property);
        let idx = self.decls.iter().position(|(name, _)| *name == property)?;
        Some(self.decls.remove(idx).1)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.decls
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.decls.retain(|(name, value)| keep(name, value));
    }
}

impl fmt::Display for StyleDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.decls.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}: {value};")?;
        }
        Ok(())
    }
}

/// Splits on `;` outside quotes and parentheses, so values such as
/// `url("a;b")` or quoted font names stay whole.
fn split_declarations(source: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in source.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                out.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&source[start..]);
    out
}

fn normalize_name(name: &str) -> SmolStr {
    let name = name.trim();
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        SmolStr::new(name.to_ascii_lowercase())
    } else {
        SmolStr::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_serialize_keeps_order() {
        let style = StyleDeclaration::parse("Text-Align: center;color:red ; ;bogus");
        assert_eq!(style.get("text-align"), Some("center"));
        assert_eq!(style.to_string(), "text-align: center; color: red;");
    }

    #[test]
    fn separators_inside_values_are_kept() {
        let style = StyleDeclaration::parse(
            r#"background: url("data:image/png;base64,AAA=") no-repeat; font-family: 'A;B', serif; color: red"#,
        );
        assert_eq!(style.len(), 3);
        assert_eq!(
            style.get("background"),
            Some(r#"url("data:image/png;base64,AAA=") no-repeat"#)
        );
        assert_eq!(style.get("font-family"), Some("'A;B', serif"));
        assert_eq!(StyleDeclaration::parse(&style.to_string()), style);

        let unquoted = StyleDeclaration::parse("background: url(a;b.png); margin-left: 4px");
        assert_eq!(unquoted.get("background"), Some("url(a;b.png)"));
        assert_eq!(unquoted.get("margin-left"), Some("4px"));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut style = StyleDeclaration::parse("a: 1; b: 2");
        style.set("a", "3");
        assert_eq!(style.to_string(), "a: 3; b: 2;");
    }

    #[test]
    fn empty_value_removes() {
        let mut style = StyleDeclaration::parse("direction: rtl");
        style.set("direction", "");
        assert!(style.is_empty());
        assert_eq!(style.to_string(), "");
    }

    #[test]
    fn remove_returns_previous_value() {
        let mut style = StyleDeclaration::parse("margin-left: 40px; color: blue");
        assert_eq!(style.remove("margin-left").as_deref(), Some("40px"));
        assert_eq!(style.remove("margin-left"), None);
        assert_eq!(style.len(), 1);
    }
}
