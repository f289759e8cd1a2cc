//! Platform cookie files.
//!
//! Some platforms reject anonymous downloads; a Netscape-format cookie file
//! exported from a logged-in browser session can be dropped into the cookie
//! directory to get past that. Validity here means only that the file
//! exists. Expired cookies surface later as an access-denied error from the
//! extractor, which is the platform's call to make, not ours.

use std::path::PathBuf;

use crate::platform::Platform;

/// Per-platform cookie file lookup.
#[derive(Debug, Clone)]
pub struct CookieStore {
    dir: PathBuf,
}

impl CookieStore {
    pub fn new(dir: PathBuf) -> Self {
        CookieStore { dir }
    }

    /// Where the cookie file for a platform lives, whether or not it exists.
    pub fn cookie_path(&self, platform: Platform) -> PathBuf {
        self.dir.join(format!("{}_cookies.txt", platform))
    }

    /// The cookie file for a platform, if one is present on disk.
    pub fn valid_cookie(&self, platform: Platform) -> Option<PathBuf> {
        let path = self.cookie_path(platform);
        path.exists().then_some(path)
    }

    /// The directory cookie files are read from.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_path_naming() {
        let store = CookieStore::new(PathBuf::from("/tmp/cookies"));
        assert_eq!(
            store.cookie_path(Platform::Douyin),
            PathBuf::from("/tmp/cookies/douyin_cookies.txt")
        );
        assert_eq!(
            store.cookie_path(Platform::Bilibili),
            PathBuf::from("/tmp/cookies/bilibili_cookies.txt")
        );
    }

    #[test]
    fn test_validity_is_file_existence() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(dir.path().to_path_buf());

        assert!(store.valid_cookie(Platform::Youtube).is_none());

        std::fs::write(store.cookie_path(Platform::Youtube), "# Netscape HTTP Cookie File\n")
            .unwrap();
        assert_eq!(
            store.valid_cookie(Platform::Youtube),
            Some(store.cookie_path(Platform::Youtube))
        );
        // Other platforms stay invalid.
        assert!(store.valid_cookie(Platform::Douyin).is_none());
    }
}
