use crate::error::WorkshopError;
use crate::workshop::{read_details, SubscriptionDetails, DESCRIPTOR_FILE};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One workshop subscription found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Directory holding the subscription, i.e. the descriptor's parent.
    pub path: PathBuf,
    pub details: SubscriptionDetails,
}

impl Subscription {
    pub fn size_human(&self) -> String {
        crate::format_size(self.details.size)
    }
}

/// Total size in bytes of the regular files under `path`.
///
/// Symlinks are neither counted nor followed, including when `path` itself
/// is one. Any unreadable entry fails the whole calculation.
pub fn dir_size(path: &Path) -> Result<u64, WorkshopError> {
    let mut total = 0u64;

    for entry in WalkDir::new(path).follow_links(false).follow_root_links(false) {
        let entry = entry.map_err(|e| WorkshopError::traversal(path, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = entry
            .metadata()
            .map_err(|e| WorkshopError::traversal(path, e))?;
        total += metadata.len();
    }

    Ok(total)
}

/// Finds every `workshop.json` under `content_root`, at any depth.
pub fn discover(content_root: &Path) -> Result<Vec<PathBuf>, WorkshopError> {
    let mut descriptors = Vec::new();

    for entry in WalkDir::new(content_root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| WorkshopError::traversal(content_root, e))?;
        if entry.file_type().is_file() && entry.file_name() == DESCRIPTOR_FILE {
            descriptors.push(entry.into_path());
        }
    }

    Ok(descriptors)
}

/// Builds the inventory: one subscription per descriptor, sized and sorted
/// largest first.
pub fn scan(content_root: &Path) -> Result<Vec<Subscription>, WorkshopError> {
    if !content_root.exists() {
        tracing::warn!(path = %content_root.display(), "workshop content folder does not exist");
        return Ok(Vec::new());
    }

    let mut found: Vec<Subscription> = Vec::new();

    for descriptor in discover(content_root)? {
        let Some(dir) = descriptor.parent() else {
            continue;
        };

        let mut details = read_details(&descriptor)?;
        details.size = dir_size(dir)?;
        tracing::debug!(
            path = %dir.display(),
            title = %details.title,
            publisher = %details.publisher_id,
            size = details.size,
            "found subscription"
        );

        found.push(Subscription {
            path: dir.to_path_buf(),
            details,
        });
    }

    // Sort by size descending
    found.sort_by(|a, b| b.details.size.cmp(&a.details.size));
    Ok(found)
}

pub fn total_size(subs: &[Subscription]) -> u64 {
    subs.iter().map(|s| s.details.size).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_subscription(root: &Path, folder: &str, title: &str, payload: usize) -> PathBuf {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(DESCRIPTOR_FILE),
            format!(r#"{{"Title": "{title}", "Type": "map"}}"#),
        )
        .unwrap();
        fs::write(dir.join("payload.ff"), vec![0u8; payload]).unwrap();
        dir
    }

    fn descriptor_len(dir: &Path) -> u64 {
        fs::metadata(dir.join(DESCRIPTOR_FILE)).unwrap().len()
    }

    #[test]
    fn dir_size_sums_nested_files() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::write(root.join("top.bin"), vec![0u8; 100]).unwrap();
        fs::write(root.join("a/mid.bin"), vec![0u8; 200]).unwrap();
        fs::write(root.join("a/b/c/deep.bin"), vec![0u8; 300]).unwrap();

        assert_eq!(dir_size(root).unwrap(), 600);
    }

    #[test]
    fn dir_size_of_empty_dir_is_zero() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(dir_size(tmp.path()).unwrap(), 0);
    }

    #[test]
    fn dir_size_fails_for_missing_path() {
        let tmp = tempfile::tempdir().unwrap();
        let err = dir_size(&tmp.path().join("gone")).unwrap_err();
        assert!(matches!(err, WorkshopError::Traversal { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn dir_size_skips_symlinked_file_and_dir() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().unwrap();
        let outside = tmp.path().join("outside");
        fs::create_dir_all(outside.join("tree")).unwrap();
        fs::write(outside.join("huge.bin"), vec![0u8; 1 << 20]).unwrap();
        fs::write(outside.join("tree/more.bin"), vec![0u8; 4096]).unwrap();

        let sub = tmp.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("real.bin"), vec![0u8; 10]).unwrap();
        symlink(outside.join("huge.bin"), sub.join("huge.bin")).unwrap();
        symlink(outside.join("tree"), sub.join("tree")).unwrap();

        assert_eq!(dir_size(&sub).unwrap(), 10);
    }

    #[cfg(unix)]
    #[test]
    fn dir_size_does_not_follow_root_symlink() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().unwrap();
        let real = tmp.path().join("real");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("data.bin"), vec![0u8; 64]).unwrap();
        let link = tmp.path().join("link");
        symlink(&real, &link).unwrap();

        assert_eq!(dir_size(&link).unwrap(), 0);
    }

    #[test]
    fn discover_finds_nested_descriptors_only() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_subscription(root, "111", "one", 1);
        write_subscription(root, "group/222", "two", 1);
        fs::write(root.join("not-workshop.json"), "{}").unwrap();
        fs::write(root.join("111/workshop.json.bak"), "{}").unwrap();

        let found = discover(root).unwrap();
        assert_eq!(
            found,
            vec![
                root.join("111").join(DESCRIPTOR_FILE),
                root.join("group/222").join(DESCRIPTOR_FILE),
            ]
        );
    }

    #[test]
    fn scan_sorts_by_size_descending() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let small = write_subscription(root, "100", "small", 500);
        let large = write_subscription(root, "200", "large", 10240);
        let medium = write_subscription(root, "300", "medium", 2048);

        let inventory = scan(root).unwrap();
        let titles: Vec<&str> = inventory.iter().map(|s| s.details.title.as_str()).collect();
        assert_eq!(titles, vec!["large", "medium", "small"]);

        assert_eq!(inventory[0].path, large);
        assert_eq!(inventory[0].details.size, 10240 + descriptor_len(&large));
        assert_eq!(inventory[2].details.size, 500 + descriptor_len(&small));
        assert_eq!(inventory[1].path, medium);

        for pair in inventory.windows(2) {
            assert!(pair[0].details.size >= pair[1].details.size);
        }
    }

    #[test]
    fn scan_is_repeatable() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_subscription(root, "1", "a", 700);
        write_subscription(root, "2", "b", 700);
        write_subscription(root, "3", "c", 50);

        let first = scan(root).unwrap();
        let second = scan(root).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn scan_empty_and_missing_roots() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(scan(tmp.path()).unwrap().is_empty());
        assert!(scan(&tmp.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn scan_fails_fast_on_bad_descriptor() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_subscription(root, "good", "good", 10);
        let bad = root.join("bad");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join(DESCRIPTOR_FILE), "not json").unwrap();

        let err = scan(root).unwrap_err();
        assert!(matches!(err, WorkshopError::Decode { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn scan_excludes_symlinked_external_file() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().unwrap();
        let external = tmp.path().join("external.bin");
        fs::write(&external, vec![0u8; 1 << 20]).unwrap();

        let root = tmp.path().join("content");
        let dir = write_subscription(&root, "42", "linked", 100);
        symlink(&external, dir.join("linked.bin")).unwrap();

        let inventory = scan(&root).unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].details.size, 100 + descriptor_len(&dir));
    }

    #[test]
    fn total_size_sums_inventory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_subscription(root, "1", "a", 500);
        write_subscription(root, "2", "b", 10240);

        let inventory = scan(root).unwrap();
        let expected: u64 = inventory.iter().map(|s| s.details.size).sum();
        assert_eq!(total_size(&inventory), expected);
        assert_eq!(total_size(&[]), 0);
    }
}
