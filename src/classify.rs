use once_cell::sync::Lazy;
use regex::Regex;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DOWNLOAD_KEYWORDS: &[&str] = &[
    "download",
    "descargar",
    "télécharger",
    "herunterladen",
    "скачать",
];

pub const FILE_EXTENSIONS: &[&str] = &[
    ".zip", ".pdf", ".exe", ".dmg", ".tar.gz", ".mp4", ".mp3", ".doc", ".docx", ".xls", ".xlsx",
];

static FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"filename="?([^";]+)"?"#).expect("valid filename regex"));

// ── Anchor classification ────────────────────────────────────────────────────

pub fn has_file_extension(href: &str) -> bool {
    let lower = href.to_lowercase();
    FILE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn has_download_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    DOWNLOAD_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Does an anchor look like it leads to a download?
pub fn is_download_anchor(href: &str, label: &str, has_download_attribute: bool) -> bool {
    has_download_attribute
        || has_download_keyword(label)
        || has_download_keyword(href)
        || has_file_extension(href)
}

// ── Direct download detection ────────────────────────────────────────────────

/// Returns `(is_direct_download, filename)` for a fetched URL.
pub fn direct_download(url: &str, content_disposition: Option<&str>) -> (bool, Option<String>) {
    if let Some(cd) = content_disposition.filter(|cd| cd.contains("attachment")) {
        let filename = FILENAME_RE
            .captures(cd)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());
        return (true, filename);
    }

    if has_file_extension(url) {
        let filename = url.rsplit('/').next().map(str::to_string);
        return (true, filename);
    }

    (false, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_attribute_wins() {
        assert!(is_download_anchor("/page", "Read more", true));
    }

    #[test]
    fn keyword_in_label_or_href() {
        assert!(is_download_anchor("/x", "Download now", false));
        assert!(is_download_anchor("/x", "TÉLÉCHARGER", false));
        assert!(is_download_anchor("/x", "Скачать", false));
        assert!(is_download_anchor("/get/download?id=3", "here", false));
        assert!(!is_download_anchor("/about", "About us", false));
    }

    #[test]
    fn extension_suffix_is_case_insensitive() {
        assert!(is_download_anchor("/files/Setup.EXE", "", false));
        assert!(is_download_anchor("release.tar.gz", "v1.0", false));
        assert!(!is_download_anchor("/files/report.pdf?x=1", "report", false));
    }

    #[test]
    fn attachment_header_gives_filename() {
        let (direct, name) =
            direct_download("https://example.com/get", Some(r#"attachment; filename="report.csv""#));
        assert!(direct);
        assert_eq!(name.as_deref(), Some("report.csv"));
    }

    #[test]
    fn attachment_without_filename() {
        assert_eq!(
            direct_download("https://example.com/get", Some("attachment")),
            (true, None)
        );
    }

    #[test]
    fn inline_disposition_is_not_download() {
        assert_eq!(
            direct_download("https://example.com/view", Some("inline")),
            (false, None)
        );
    }

    #[test]
    fn extension_in_url() {
        let (direct, name) = direct_download("https://cdn.example.com/file.zip", None);
        assert!(direct);
        assert_eq!(name.as_deref(), Some("file.zip"));
    }

    #[test]
    fn header_takes_precedence_over_extension() {
        let (_, name) = direct_download(
            "https://cdn.example.com/file.zip",
            Some(r#"attachment; filename="other.zip""#),
        );
        assert_eq!(name.as_deref(), Some("other.zip"));
    }

    #[test]
    fn non_ascii_filename() {
        let (direct, name) =
            direct_download("https://example.com/get", Some(r#"attachment; filename="résumé.pdf""#));
        assert!(direct);
        assert_eq!(name.as_deref(), Some("résumé.pdf"));
    }
}
