//! HTML form model and extraction

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Submission method of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormMethod {
    #[default]
    Get,
    Post,
}

impl FormMethod {
    /// Parse a `method` attribute; anything other than POST falls back to GET
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("post") {
            FormMethod::Post
        } else {
            FormMethod::Get
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormMethod::Get => "GET",
            FormMethod::Post => "POST",
        }
    }
}

impl std::fmt::Display for FormMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field names that carry an anti-CSRF token, compared case-insensitively
pub const CSRF_TOKEN_FIELDS: &[&str] = &["csrf_token", "_csrf", "authenticity_token", "csrfmiddlewaretoken"];

/// A discovered form. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    /// Raw action attribute, possibly empty or relative
    pub action: String,

    pub method: FormMethod,

    /// Input names, unique, in document order
    pub fields: Vec<String>,
}

impl Form {
    pub fn new<I, S>(action: impl Into<String>, method: FormMethod, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !field.is_empty() && !unique.contains(&field) {
                unique.push(field);
            }
        }

        Self {
            action: action.into(),
            method,
            fields: unique,
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// First field that looks like an anti-CSRF token
    pub fn csrf_token_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| CSRF_TOKEN_FIELDS.iter().any(|t| f.eq_ignore_ascii_case(t)))
            .map(String::as_str)
    }

    pub fn is_csrf_protected(&self) -> bool {
        self.csrf_token_field().is_some()
    }
}

/// Extract every form from an HTML document
pub fn parse_forms(markup: &str) -> Vec<Form> {
    let document = Html::parse_document(markup);

    let (Ok(form_selector), Ok(field_selector)) = (
        Selector::parse("form"),
        Selector::parse("input[name], textarea[name], select[name]"),
    ) else {
        return Vec::new();
    };

    document
        .select(&form_selector)
        .map(|form| {
            let action = form.value().attr("action").unwrap_or("").trim();
            let method = form
                .value()
                .attr("method")
                .map(FormMethod::parse)
                .unwrap_or_default();
            let fields = form
                .select(&field_selector)
                .filter_map(|input| input.value().attr("name"))
                .map(str::trim);

            Form::new(action, method, fields)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms_defaults() {
        let html = r#"
            <html><body>
                <form>
                    <input name="q">
                </form>
                <form action="/login" method="post">
                    <div><input type="text" name="user"></div>
                    <input type="password" name="pass">
                    <input type="submit" value="Go">
                    <textarea name="note"></textarea>
                    <select name="role"><option>a</option></select>
                    <input name="user">
                </form>
                <form action="search" method="PUT"></form>
            </body></html>
        "#;

        let forms = parse_forms(html);
        assert_eq!(forms.len(), 3);

        assert_eq!(forms[0].action, "");
        assert_eq!(forms[0].method, FormMethod::Get);
        assert_eq!(forms[0].fields, vec!["q"]);

        assert_eq!(forms[1].action, "/login");
        assert_eq!(forms[1].method, FormMethod::Post);
        assert_eq!(forms[1].fields, vec!["user", "pass", "note", "role"]);

        assert_eq!(forms[2].method, FormMethod::Get);
        assert!(forms[2].fields.is_empty());
    }

    #[test]
    fn test_no_forms() {
        assert!(parse_forms("<p>nothing here</p>").is_empty());
    }

    #[test]
    fn test_csrf_token_detection() {
        let rails = Form::new("/post", FormMethod::Post, ["Authenticity_Token", "body"]);
        assert!(rails.is_csrf_protected());
        assert_eq!(rails.csrf_token_field(), Some("Authenticity_Token"));

        let django = parse_forms(
            r#"<form method="post"><input type="hidden" name="csrfmiddlewaretoken" value="x"><input name="q"></form>"#,
        );
        assert!(django[0].is_csrf_protected());

        let bare = Form::new("/post", FormMethod::Post, ["csrf", "token", "my_csrf_token"]);
        assert!(!bare.is_csrf_protected());
        assert_eq!(bare.csrf_token_field(), None);
    }

    #[test]
    fn test_form_new_dedupes() {
        let form = Form::new("/a", FormMethod::Post, ["x", "y", "x", ""]);
        assert_eq!(form.fields, vec!["x", "y"]);
        assert!(form.has_field("y"));
        assert!(!form.has_field("z"));
    }
}
