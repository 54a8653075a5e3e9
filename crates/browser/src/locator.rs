//! Element locators.
//!
//! Plain CSS goes straight to `document.querySelector`. The extra
//! `scope:has-text("text")` form matches the first element under `scope`
//! whose visible text or `aria-label` contains `text` (case-insensitive,
//! whitespace-collapsed). Both resolve through injected JavaScript.

use std::fmt;

use crate::error::BrowserError;

const HAS_TEXT: &str = ":has-text(";

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    Text { scope: String, text: String },
}

impl Locator {
    /// Parse a selector string.
    pub fn parse(raw: &str) -> Result<Self, BrowserError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(BrowserError::InvalidSelector("selector is empty".into()));
        }

        let Some(start) = raw.find(HAS_TEXT) else {
            check_balanced(raw)?;
            return Ok(Self::Css(raw.to_string()));
        };

        let scope = raw[..start].trim();
        let rest = &raw[start + HAS_TEXT.len()..];
        let Some(arg) = rest.strip_suffix(')') else {
            return Err(BrowserError::InvalidSelector(format!(
                "'{raw}': :has-text(...) must close the selector"
            )));
        };

        let text = unquote(arg.trim());
        if text.trim().is_empty() {
            return Err(BrowserError::InvalidSelector(format!(
                "'{raw}': :has-text needs a non-empty text"
            )));
        }
        if text.contains(HAS_TEXT) {
            return Err(BrowserError::InvalidSelector(format!(
                "'{raw}': nested :has-text is not supported"
            )));
        }

        let scope = if scope.is_empty() {
            "*"
        } else {
            check_balanced(scope)?;
            scope
        };

        Ok(Self::Text {
            scope: scope.to_string(),
            text: text.to_string(),
        })
    }

    /// Expression evaluating to `true` when a matching element exists.
    pub fn presence_script(&self) -> String {
        format!("(() => {{ {} return !!el; }})()", self.find_js())
    }

    /// Expression that focuses the first match and returns whether one existed.
    pub fn focus_script(&self) -> String {
        format!(
            "(() => {{ {} if (!el) return false; el.scrollIntoView({{ block: 'center' }}); el.focus(); return true; }})()",
            self.find_js()
        )
    }

    /// Statement binding `el` to the first match or `null`.
    fn find_js(&self) -> String {
        match self {
            Self::Css(css) => format!("const el = document.querySelector({});", js_string(css)),
            Self::Text { scope, text } => format!(
                "const norm = (s) => (s || '').replace(/\\s+/g, ' ').trim().toLowerCase(); \
                 const needle = norm({}); \
                 const el = Array.from(document.querySelectorAll({})).find((c) => \
                 norm(c.innerText || c.textContent).includes(needle) || \
                 norm(c.getAttribute('aria-label')).includes(needle)) || null;",
                js_string(text),
                js_string(scope)
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => f.write_str(css),
            Self::Text { scope, text } => write!(f, "{scope}:has-text({text:?})"),
        }
    }
}

fn unquote(arg: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = arg
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    arg
}

/// Reject unbalanced brackets and quotes; the browser would throw on them anyway.
fn check_balanced(css: &str) -> Result<(), BrowserError> {
    let mut stack = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = css.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '(' => stack.push(c),
            ']' if stack.pop() != Some('[') => {
                return Err(BrowserError::InvalidSelector(format!("'{css}': unbalanced ']'")));
            },
            ')' if stack.pop() != Some('(') => {
                return Err(BrowserError::InvalidSelector(format!("'{css}': unbalanced ')'")));
            },
            _ => {},
        }
    }

    if quote.is_some() || !stack.is_empty() {
        return Err(BrowserError::InvalidSelector(format!(
            "'{css}': unterminated bracket or quote"
        )));
    }
    Ok(())
}

fn js_string(s: &str) -> String {
    // Serializing a &str cannot fail.
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(r#"button:has-text("Stop generating")"#, "button", "Stop generating")]
    #[case("button:has-text('Stop')", "button", "Stop")]
    #[case("div.toolbar button:has-text(Stop)", "div.toolbar button", "Stop")]
    #[case(r#":has-text("Stop")"#, "*", "Stop")]
    fn parses_text_locators(#[case] raw: &str, #[case] scope: &str, #[case] text: &str) {
        assert_eq!(
            Locator::parse(raw).unwrap(),
            Locator::Text {
                scope: scope.into(),
                text: text.into()
            }
        );
    }

    #[rstest]
    #[case(r#"textarea[placeholder="Message Claude..."]"#)]
    #[case("div[contenteditable='true']")]
    #[case("form > textarea:not([disabled])")]
    fn parses_css_locators(#[case] raw: &str) {
        assert_eq!(Locator::parse(raw).unwrap(), Locator::Css(raw.into()));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("button:has-text()")]
    #[case(r#"button:has-text("")"#)]
    #[case(r#"button:has-text("Stop") > span"#)]
    #[case("textarea[placeholder=\"x\"")]
    #[case("div:not(.a")]
    #[case("div]")]
    fn rejects_malformed(#[case] raw: &str) {
        let err = Locator::parse(raw).unwrap_err();
        assert!(matches!(err, BrowserError::InvalidSelector(_)), "{raw}: {err}");
    }

    #[test]
    fn scripts_escape_selector_text() {
        let loc = Locator::parse(r#"textarea[placeholder="Say \"hi\""]"#).unwrap();
        let script = loc.presence_script();
        assert!(script.contains("document.querySelector("));
        assert!(script.contains(r#"\""#));

        let loc = Locator::parse("button:has-text(\"Stop </script>\")").unwrap();
        let script = loc.focus_script();
        assert!(script.contains("querySelectorAll(\"button\")"));
        assert!(script.contains("el.focus()"));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let loc = Locator::parse(r#"button:has-text("Stop generating")"#).unwrap();
        assert_eq!(Locator::parse(&loc.to_string()).unwrap(), loc);
    }
}
