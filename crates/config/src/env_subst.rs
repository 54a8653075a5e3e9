/// Replace `${ENV_VAR}` and `${ENV_VAR:-fallback}` placeholders in raw config text.
///
/// Unresolvable variables without a fallback are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with a caller-provided lookup, so tests do not
/// have to mutate the process environment.
pub(crate) fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // Unterminated placeholder: emit the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };

        let value = if name.is_empty() {
            None
        } else {
            lookup(name)
        };

        match (value, fallback) {
            (Some(value), Some(fallback)) if value.is_empty() => out.push_str(fallback),
            (Some(value), _) => out.push_str(&value),
            (None, Some(fallback)) if !name.is_empty() => out.push_str(fallback),
            _ => {
                out.push_str("${");
                out.push_str(body);
                out.push('}');
            },
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "AUTOCONTINUE_TEST_URL" => Some("https://chat.example.com".to_string()),
            "AUTOCONTINUE_EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("url = \"${AUTOCONTINUE_TEST_URL}/new\"", lookup),
            "url = \"https://chat.example.com/new\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env_with("${AUTOCONTINUE_NOPE}", lookup),
            "${AUTOCONTINUE_NOPE}"
        );
    }

    #[test]
    fn uses_fallback_for_missing_or_empty() {
        assert_eq!(substitute_env_with("${AUTOCONTINUE_NOPE:-2000}", lookup), "2000");
        assert_eq!(substitute_env_with("${AUTOCONTINUE_EMPTY:-x}", lookup), "x");
        assert_eq!(
            substitute_env_with("${AUTOCONTINUE_TEST_URL:-unused}", lookup),
            "https://chat.example.com"
        );
    }

    #[test]
    fn empty_value_without_fallback_substitutes_empty() {
        assert_eq!(substitute_env_with("[${AUTOCONTINUE_EMPTY}]", lookup), "[]");
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(substitute_env_with("a ${OOPS", lookup), "a ${OOPS");
        assert_eq!(substitute_env_with("${}", lookup), "${}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
