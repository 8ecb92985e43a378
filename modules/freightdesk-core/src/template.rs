use anyhow::{bail, Result};
use std::collections::HashMap;

/// Resolve `{{var}}` placeholders from a runtime context map.
/// `\{{` emits a literal `{{`. Unknown variables are left in place.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'{') {
            chars.next();
            if chars.peek() == Some(&'{') {
                chars.next();
                result.push_str("{{");
            } else {
                result.push_str("\\{");
            }
            continue;
        }

        if c == '{' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_name = String::new();
            let mut closed = false;
            while let Some(ch) = chars.next() {
                if ch == '}' && chars.peek() == Some(&'}') {
                    chars.next();
                    closed = true;
                    break;
                }
                var_name.push(ch);
            }

            if !closed {
                // Malformed: emit what we have
                result.push_str("{{");
                result.push_str(&var_name);
                return result;
            }

            let key = var_name.trim();
            match vars.get(key) {
                Some(value) => result.push_str(value),
                None => {
                    result.push_str("{{");
                    result.push_str(key);
                    result.push_str("}}");
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Check that every `{{...}}` in a template is in the allowed set.
pub fn validate(template: &str, allowed: &[&str]) -> Result<()> {
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        if start > 0 && rest[..start].ends_with('\\') {
            rest = &rest[start + 2..];
            continue;
        }
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            bail!("Unclosed template variable in: {}", template);
        };
        let name = after[..end].trim();
        if !allowed.contains(&name) {
            bail!(
                "Unknown template variable: {{{{{}}}}}. Allowed vars: {:?}",
                name,
                allowed
            );
        }
        rest = &after[end + 2..];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("platform_name", "FreightDesk".to_string()),
            ("today", "2026-10-15".to_string()),
        ])
    }

    #[test]
    fn substitutes_known_vars() {
        let out = render("Welcome to {{ platform_name }} on {{today}}.", &vars());
        assert_eq!(out, "Welcome to FreightDesk on 2026-10-15.");
    }

    #[test]
    fn leaves_unknown_vars() {
        assert_eq!(render("{{missing}}!", &vars()), "{{missing}}!");
    }

    #[test]
    fn escaped_braces_are_literal() {
        assert_eq!(render(r"\{{platform_name}}", &vars()), "{{platform_name}}");
    }

    #[test]
    fn unclosed_var_is_emitted_raw() {
        assert_eq!(render("Hi {{platform", &vars()), "Hi {{platform");
    }

    #[test]
    fn validate_rejects_unknown() {
        assert!(validate("{{platform_name}} {{today}}", &["platform_name", "today"]).is_ok());
        assert!(validate("{{secret}}", &["platform_name"]).is_err());
        assert!(validate("{{platform_name", &["platform_name"]).is_err());
        assert!(validate(r"\{{anything}}", &[]).is_ok());
    }
}
