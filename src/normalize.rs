use url::Url;

/// Turn an href into an absolute URL relative to `base`.
///
/// Deliberately permissive: `.`/`..` segments are not collapsed and malformed
/// hrefs are passed through glued onto the base.
pub fn absolutize(href: &str, base: &Url) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }

    let scheme = base.scheme();
    if href.starts_with("//") {
        return format!("{}:{}", scheme, href);
    }

    let origin = match base.port() {
        Some(port) => format!("{}://{}:{}", scheme, base.host_str().unwrap_or(""), port),
        None => format!("{}://{}", scheme, base.host_str().unwrap_or("")),
    };
    if href.starts_with('/') {
        return format!("{}{}", origin, href);
    }

    let path = base.path();
    let dir = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    };
    format!("{}{}{}", origin, dir, href)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn absolute_href_unchanged() {
        let b = base("https://example.com/page");
        assert_eq!(
            absolutize("https://cdn.example.com/a.zip", &b),
            "https://cdn.example.com/a.zip"
        );
        assert_eq!(absolutize("http://x.org/y", &b), "http://x.org/y");
    }

    #[test]
    fn protocol_relative_gets_base_scheme() {
        let b = base("https://example.com/page");
        assert_eq!(
            absolutize("//mirror.example.net/f.tar.gz", &b),
            "https://mirror.example.net/f.tar.gz"
        );
    }

    #[test]
    fn root_relative_uses_origin() {
        let b = base("https://example.com/a/b/page.html");
        assert_eq!(
            absolutize("/files/doc.pdf", &b),
            "https://example.com/files/doc.pdf"
        );
    }

    #[test]
    fn path_relative_drops_last_segment() {
        assert_eq!(
            absolutize("files/doc.pdf", &base("https://example.com/page")),
            "https://example.com/files/doc.pdf"
        );
        assert_eq!(
            absolutize("doc.pdf", &base("https://example.com/a/b/index.html")),
            "https://example.com/a/b/doc.pdf"
        );
        assert_eq!(
            absolutize("doc.pdf", &base("https://example.com/a/b/")),
            "https://example.com/a/b/doc.pdf"
        );
    }

    #[test]
    fn dot_segments_are_kept() {
        assert_eq!(
            absolutize("../up.zip", &base("https://example.com/a/b/index.html")),
            "https://example.com/a/b/../up.zip"
        );
    }

    #[test]
    fn port_is_preserved() {
        assert_eq!(
            absolutize("/x.zip", &base("http://127.0.0.1:8080/dl/")),
            "http://127.0.0.1:8080/x.zip"
        );
    }

    #[test]
    fn idempotent() {
        let b = base("https://example.com/a/page");
        for href in ["files/doc.pdf", "/root.zip", "//cdn.net/x", "https://o.org/y"] {
            let once = absolutize(href, &b);
            assert_eq!(absolutize(&once, &b), once);
        }
    }
}
