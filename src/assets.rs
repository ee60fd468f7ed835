use std::collections::HashMap;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Image file patterns a screenshot may point at.
const IMAGE_PATTERNS: &[&str] = &["*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.svg", "*.avif"];

/// Index of the image files under an asset root, keyed by their path
/// relative to the root with `/` separators.
pub struct AssetIndex {
    root: PathBuf,
    files: HashMap<String, PathBuf>,
}

impl AssetIndex {
    /// Walk `root` once and record every image file found.
    ///
    /// A missing or unreadable root yields an empty index: every screenshot
    /// then renders as unavailable, which is not an error.
    pub fn scan(root: &Path) -> Self {
        let matcher = image_matcher();
        let mut files = HashMap::new();

        if !root.is_dir() {
            warn!(root = %root.display(), "asset root is not a directory");
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());

        for entry in walker {
            let path = entry.path();
            let Some(name) = path.file_name() else {
                continue;
            };
            if !matcher.is_match(name) {
                continue;
            }
            if let Ok(rel) = path.strip_prefix(root) {
                files.insert(normalize(&rel.to_string_lossy()), path.to_path_buf());
            }
        }

        debug!(root = %root.display(), images = files.len(), "asset index built");
        Self {
            root: root.to_path_buf(),
            files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Resolve a screenshot `src` such as `/balone.png` or `shots/a.png`.
    /// Remote URLs are never resolved locally.
    pub fn resolve(&self, src: &str) -> Option<&Path> {
        if src.starts_with("http://") || src.starts_with("https://") {
            return None;
        }
        self.files.get(&normalize(src)).map(PathBuf::as_path)
    }

    pub fn contains(&self, src: &str) -> bool {
        self.resolve(src).is_some()
    }
}

/// Strip leading `/` and `./`, and use `/` as the separator.
fn normalize(src: &str) -> String {
    let unified = src.replace('\\', "/");
    let mut rest = unified.as_str();
    loop {
        if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
        } else {
            break;
        }
    }
    rest.to_string()
}

fn image_matcher() -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in IMAGE_PATTERNS {
        if let Ok(glob) = GlobBuilder::new(pattern).case_insensitive(true).build() {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("shots")).unwrap();
        fs::write(dir.path().join("balone.png"), b"png").unwrap();
        fs::write(dir.path().join("Loanyfy.JPG"), b"jpg").unwrap();
        fs::write(dir.path().join("shots/chatbot.webp"), b"webp").unwrap();
        fs::write(dir.path().join("notes.txt"), b"text").unwrap();
        dir
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/balone.png"), "balone.png");
        assert_eq!(normalize("./shots/a.png"), "shots/a.png");
        assert_eq!(normalize("shots\\a.png"), "shots/a.png");
    }

    #[test]
    fn test_scan_keeps_only_images() {
        let dir = setup();
        let index = AssetIndex::scan(dir.path());
        assert_eq!(index.len(), 3);
        assert!(!index.contains("notes.txt"));
    }

    #[test]
    fn test_resolve_variants() {
        let dir = setup();
        let index = AssetIndex::scan(dir.path());
        assert!(index.contains("/balone.png"));
        assert!(index.contains("Loanyfy.JPG"));
        assert!(index.contains("./shots/chatbot.webp"));
        assert!(!index.contains("/missing.png"));
        assert!(!index.contains("https://example.com/balone.png"));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let index = AssetIndex::scan(Path::new("/no/such/asset/root"));
        assert_eq!(index.len(), 0);
        assert!(!index.contains("/balone.png"));
    }
}
