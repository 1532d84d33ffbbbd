use crate::form::params::HELPER_PARAMETER_KEYS;
use indexmap::IndexMap;

/// Escapes `& < > " '` for use in element content and attribute values.
pub fn escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Content of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content<'a> {
    /// Self-closing element.
    Empty,
    Escaped(&'a str),
    /// Already rendered markup.
    Raw(&'a str),
}

/// Renders `<name attr="value" ...>`: attribute values are escaped, `None`
/// values give bare attributes, helper parameter keys are dropped.
pub fn tag(name: &str, attrs: &IndexMap<String, Option<String>>, content: Content<'_>) -> String {
    let mut html = format!("<{name}");

    for (key, value) in attrs.iter().filter(|(key, _)| !HELPER_PARAMETER_KEYS.contains(&key.as_str())) {
        match value {
            Some(value) => {
                html.push_str(&format!(" {key}=\"{}\"", escape(value)));
            }
            None => {
                html.push(' ');
                html.push_str(key);
            }
        }
    }

    match content {
        Content::Empty => html.push_str(" />"),
        Content::Escaped(content) => html.push_str(&format!(">{}</{name}>", escape(content))),
        Content::Raw(content) => html.push_str(&format!(">{content}</{name}>")),
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, Option<&str>)]) -> IndexMap<String, Option<String>> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.map(str::to_string))).collect()
    }

    #[test]
    fn escapes_all_specials() {
        assert_eq!(escape(r#"<a href="x">Tom & 'Jerry'</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;");
    }

    #[test]
    fn self_closing() {
        let html = tag("input", &attrs(&[("type", Some("text")), ("name", Some("q")), ("value", Some("\"hi\""))]), Content::Empty);
        assert_eq!(html, r#"<input type="text" name="q" value="&quot;hi&quot;" />"#);
    }

    #[test]
    fn bare_attributes_and_stripped_keys() {
        let html = tag("select", &attrs(&[("name", Some("c")), ("multiple", None), ("default", Some("r"))]), Content::Raw("\n"));
        assert_eq!(html, "<select name=\"c\" multiple>\n</select>");
    }

    #[test]
    fn escaped_content() {
        assert_eq!(tag("textarea", &IndexMap::new(), Content::Escaped("<b>")), "<textarea>&lt;b&gt;</textarea>");
    }
}
