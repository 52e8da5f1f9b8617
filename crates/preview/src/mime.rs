//! Content-Type selection.

use std::path::Path;

use mime::Mime;

/// Maps a file path to its MIME type by extension.
///
/// The table covers what the transcript exporter actually emits; everything
/// else is `application/octet-stream`. No content sniffing.
pub fn mime_for(path: &Path) -> Mime {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js" | "mjs") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("json") => mime::APPLICATION_JSON,
        Some("md" | "markdown") => "text/markdown; charset=utf-8".parse().unwrap(),
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("svg") => mime::IMAGE_SVG,
        Some("ico") => "image/x-icon".parse().unwrap(),
        Some("woff") => mime::FONT_WOFF,
        Some("woff2") => mime::FONT_WOFF2,
        Some("pdf") => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(mime_for(Path::new("/site/index.html")), mime::TEXT_HTML_UTF_8);
        assert_eq!(mime_for(Path::new("/site/style.css")), mime::TEXT_CSS_UTF_8);
        assert_eq!(mime_for(Path::new("/site/app.js")), mime::APPLICATION_JAVASCRIPT_UTF_8);
        assert_eq!(mime_for(Path::new("/site/session.md")).essence_str(), "text/markdown");
        assert_eq!(mime_for(Path::new("/site/logo.png")), mime::IMAGE_PNG);
    }

    #[test]
    fn extension_case_is_ignored() {
        assert_eq!(mime_for(Path::new("/site/INDEX.HTML")), mime::TEXT_HTML_UTF_8);
        assert_eq!(mime_for(Path::new("/site/photo.JPG")), mime::IMAGE_JPEG);
    }

    #[test]
    fn unknown_and_missing_extensions_fall_back() {
        assert_eq!(mime_for(Path::new("/site/archive.zzz")), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(mime_for(Path::new("/site/LICENSE")), mime::APPLICATION_OCTET_STREAM);
    }
}
