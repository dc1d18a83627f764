//! The `_headers` file shipped with every deployment.

/// Security and cache headers in the `_headers` format understood by static
/// hosts: a path pattern line followed by indented `Name: value` lines.
pub const HEADERS_FILE: &str = "\
/*
  X-Frame-Options: DENY
  X-Content-Type-Options: nosniff
  Referrer-Policy: strict-origin-when-cross-origin
  Permissions-Policy: camera=(), microphone=(), geolocation=()

/*.html
  Cache-Control: public, max-age=0, must-revalidate

/*.css
  Cache-Control: public, max-age=3600, must-revalidate

/*.js
  Cache-Control: public, max-age=3600, must-revalidate
";

/// Headers a `_headers` file assigns to `path`, later rules overriding
/// earlier ones.
pub fn headers_for<'a>(headers_file: &'a str, path: &str) -> Vec<(&'a str, &'a str)> {
    let mut headers: Vec<(&'a str, &'a str)> = Vec::new();
    let mut applies = false;
    for line in headers_file.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with(' ') {
            applies = pattern_matches(line.trim(), path);
            continue;
        }
        if !applies {
            continue;
        }
        if let Some((name, value)) = line.trim().split_once(':') {
            let name = name.trim();
            headers.retain(|(n, _)| *n != name);
            headers.push((name, value.trim()));
        }
    }
    headers
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let path = path.trim_start_matches('/');
    match pattern.strip_prefix("/*") {
        Some("") => true,
        Some(suffix) => path.ends_with(suffix),
        None => pattern.trim_start_matches('/') == path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(headers: &'a [(&str, &str)], name: &str) -> Option<&'a str> {
        headers.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    #[test]
    fn every_path_gets_security_headers() {
        for path in ["index.html", "styles.css", "app.js", "logo.svg"] {
            let headers = headers_for(HEADERS_FILE, path);
            assert_eq!(header(&headers, "X-Frame-Options"), Some("DENY"), "{}", path);
            assert_eq!(header(&headers, "X-Content-Type-Options"), Some("nosniff"));
        }
    }

    #[test]
    fn html_is_revalidated_assets_cached() {
        let html = headers_for(HEADERS_FILE, "/index.html");
        assert_eq!(
            header(&html, "Cache-Control"),
            Some("public, max-age=0, must-revalidate")
        );
        let css = headers_for(HEADERS_FILE, "styles.css");
        assert_eq!(
            header(&css, "Cache-Control"),
            Some("public, max-age=3600, must-revalidate")
        );
        assert_eq!(header(&headers_for(HEADERS_FILE, "logo.svg"), "Cache-Control"), None);
    }

    #[test]
    fn exact_path_rule_overrides_wildcard() {
        let file = "/*\n  Cache-Control: no-store\n\n/index.html\n  Cache-Control: max-age=60\n";
        assert_eq!(header(&headers_for(file, "index.html"), "Cache-Control"), Some("max-age=60"));
        assert_eq!(header(&headers_for(file, "app.js"), "Cache-Control"), Some("no-store"));
    }
}
