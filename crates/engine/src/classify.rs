//! Request classification.
//!
//! Classification looks at the URL path only: no content-type sniffing, no
//! query string. Rules are checked in order and the first match wins:
//!
//! 1. Critical documents (`/`, `/index.html`)
//! 2. Content-hashed bundler output under `/assets/` (`index-1a2b3c4d.js`)
//! 3. Images by extension
//! 4. Everything else is a static asset

use std::sync::LazyLock;

use edgecache_client::{Method, PageRequest, same_origin};
use regex::Regex;
use url::Url;

/// The category a request URL is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    CriticalDocument,
    HashedBuildAsset,
    ImageAsset,
    StaticAsset,
}

const CRITICAL_DOCUMENTS: &[&str] = &["/", "/index.html"];

const BUILD_DIR_SEGMENT: &str = "/assets/";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "ico"];

/// 8+ hex digits delimited by `-` or `.` right before the extension.
static CONTENT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[-.][0-9a-f]{8,}\.(?:js|css)$").expect("content hash pattern is valid"));

/// Classify a URL. Total: every URL gets a class.
pub fn classify(url: &Url) -> AssetClass {
    let path = url.path();

    if CRITICAL_DOCUMENTS.contains(&path) {
        return AssetClass::CriticalDocument;
    }

    if path.contains(BUILD_DIR_SEGMENT) && CONTENT_HASH.is_match(path) {
        return AssetClass::HashedBuildAsset;
    }

    if let Some(ext) = extension(path)
        && IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext))
    {
        return AssetClass::ImageAsset;
    }

    AssetClass::StaticAsset
}

/// Only same-origin GETs go through the cache; everything else is passed
/// straight to the network.
pub fn is_intercepted(request: &PageRequest, origin: &Url) -> bool {
    request.method == Method::GET && same_origin(&request.url, origin)
}

fn extension(path: &str) -> Option<&str> {
    let file = path.rsplit('/').next()?;
    file.rsplit_once('.').map(|(_, ext)| ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_of(url: &str) -> AssetClass {
        classify(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_critical_documents() {
        assert_eq!(class_of("https://www.example.it/"), AssetClass::CriticalDocument);
        assert_eq!(class_of("https://www.example.it"), AssetClass::CriticalDocument);
        assert_eq!(class_of("https://www.example.it/index.html"), AssetClass::CriticalDocument);
    }

    #[test]
    fn test_critical_documents_ignore_query_string() {
        assert_eq!(class_of("https://www.example.it/?utm_source=mail"), AssetClass::CriticalDocument);
        assert_eq!(class_of("https://www.example.it/index.html?lang=en#top"), AssetClass::CriticalDocument);
    }

    #[test]
    fn test_other_html_is_not_critical() {
        assert_eq!(class_of("https://www.example.it/privacy.html"), AssetClass::StaticAsset);
        assert_eq!(class_of("https://www.example.it/sub/index.html"), AssetClass::StaticAsset);
    }

    #[test]
    fn test_hashed_build_assets() {
        assert_eq!(class_of("https://www.example.it/assets/index-4f3c2a1b.js"), AssetClass::HashedBuildAsset);
        assert_eq!(class_of("https://www.example.it/assets/vendor.0123456789abcdef.css"), AssetClass::HashedBuildAsset);
        assert_eq!(class_of("https://www.example.it/assets/index-4F3C2A1B.js?v=1"), AssetClass::HashedBuildAsset);
    }

    #[test]
    fn test_unhashed_build_output_is_static() {
        assert_eq!(class_of("https://www.example.it/assets/index.js"), AssetClass::StaticAsset);
        assert_eq!(class_of("https://www.example.it/assets/index-1234567.js"), AssetClass::StaticAsset);
        assert_eq!(class_of("https://www.example.it/assets/index-zzzzzzzz.css"), AssetClass::StaticAsset);
    }

    #[test]
    fn test_hash_outside_build_dir_is_static() {
        assert_eq!(class_of("https://www.example.it/js/index-4f3c2a1b.js"), AssetClass::StaticAsset);
    }

    #[test]
    fn test_hashed_non_script_in_build_dir() {
        assert_eq!(class_of("https://www.example.it/assets/hero-4f3c2a1b.webp"), AssetClass::ImageAsset);
        assert_eq!(class_of("https://www.example.it/assets/font-4f3c2a1b.woff2"), AssetClass::StaticAsset);
    }

    #[test]
    fn test_images() {
        for ext in ["jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "PNG"] {
            let url = format!("https://www.example.it/images/poster.{ext}");
            assert_eq!(class_of(&url), AssetClass::ImageAsset, "{url}");
        }
    }

    #[test]
    fn test_static_fallback() {
        assert_eq!(class_of("https://www.example.it/manifest.json"), AssetClass::StaticAsset);
        assert_eq!(class_of("https://www.example.it/robots.txt"), AssetClass::StaticAsset);
        assert_eq!(class_of("https://www.example.it/images/"), AssetClass::StaticAsset);
        assert_eq!(class_of("https://www.example.it/images.png/readme"), AssetClass::StaticAsset);
    }

    #[test]
    fn test_is_intercepted() {
        let origin = Url::parse("https://www.example.it").unwrap();
        let same = Url::parse("https://www.example.it/index.html").unwrap();
        let cross = Url::parse("https://fonts.example.com/font.woff2").unwrap();

        assert!(is_intercepted(&PageRequest::get(same.clone()), &origin));
        assert!(!is_intercepted(&PageRequest::new(Method::POST, same), &origin));
        assert!(!is_intercepted(&PageRequest::get(cross), &origin));
    }
}
