//! Homepage

use crate::{AppState, Flow, Request, Response};

/// `GET /` with an optional `?name=` greeting
pub fn homepage(req: &Request, _state: &AppState) -> Flow {
    Flow::Respond(Response::html(render(req.query_param("name").as_deref())))
}

fn render(name: Option<&str>) -> String {
    let mut html = String::from("<div><h1>Homepage</h1>");
    match name.filter(|n| !n.is_empty()) {
        Some(name) => {
            html.push_str("<h3>Welcome ");
            html.push_str(&escape_html(name));
            html.push_str("!</h3></div>");
        }
        None => html.push_str("</div>"),
    }
    html
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        assert_eq!(render(None), "<div><h1>Homepage</h1></div>");
        assert_eq!(render(Some("")), "<div><h1>Homepage</h1></div>");
        assert_eq!(
            render(Some("Ada")),
            "<div><h1>Homepage</h1><h3>Welcome Ada!</h3></div>"
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape_html(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#x27;y&#x27;)&lt;/script&gt;"
        );
    }
}
