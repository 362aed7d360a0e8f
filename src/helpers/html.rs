//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape text content and turn line breaks into `<br />`
pub fn text_to_html(s: &str) -> String {
    html_escape(s).replace('\n', "<br />")
}

/// Render an attribute list as ` key="value"` pairs; `None` values become bare flags
pub fn attributes<'a, I>(attrs: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut out = String::new();
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        if let Some(value) = value {
            out.push_str("=\"");
            out.push_str(&html_escape(value));
            out.push('"');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_text_to_html() {
        assert_eq!(text_to_html("one\ntwo < three"), "one<br />two &lt; three");
    }

    #[test]
    fn test_attributes() {
        let attrs = attributes([("src", Some("a.js")), ("async", None), ("title", Some("\"q\""))]);
        assert_eq!(attrs, r#" src="a.js" async title="&quot;q&quot;""#);
    }
}
