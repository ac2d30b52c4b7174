//! Version index page

use versa_core::ApiVersion;

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Generate the docs index page, one link per version document
///
/// `versions` is listed in the given order; the first entry is labelled as
/// the latest.
pub fn docs_html(title: &str, openapi_path: &str, versions: &[ApiVersion]) -> String {
    let title = escape(title);
    let mut html = String::with_capacity(1024 + versions.len() * 128);
    html.push_str(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>"#,
    );
    html.push_str(&title);
    html.push_str(
        r#" - API versions</title>
    <style>
        body { font-family: sans-serif; margin: 2rem auto; max-width: 40rem; }
        li { margin: 0.4rem 0; }
        .latest { font-weight: bold; }
    </style>
</head>
<body>
    <h1>"#,
    );
    html.push_str(&title);
    html.push_str("</h1>\n    <ul>\n");

    for (idx, version) in versions.iter().enumerate() {
        let href = escape(&format!("{openapi_path}?version={version}"));
        if idx == 0 {
            html.push_str(&format!(
                "        <li class=\"latest\"><a href=\"{href}\">{version}</a> (latest)</li>\n"
            ));
        } else {
            html.push_str(&format!("        <li><a href=\"{href}\">{version}</a></li>\n"));
        }
    }

    html.push_str("    </ul>\n</body>\n</html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docs_html_lists_versions() {
        let versions: Vec<ApiVersion> = vec!["2024-02-01".parse().unwrap(), "2024-01-01".parse().unwrap()];
        let html = docs_html("Pets <API>", "/docs/openapi.json", &versions);

        assert!(html.contains("<title>Pets &lt;API&gt; - API versions</title>"));
        assert!(html.contains(r#"<a href="/docs/openapi.json?version=2024-02-01">2024-02-01</a> (latest)"#));
        assert!(html.contains(r#"<li><a href="/docs/openapi.json?version=2024-01-01">2024-01-01</a></li>"#));
    }
}
