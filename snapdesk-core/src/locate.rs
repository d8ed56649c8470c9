//! Breadth-first executable search across every mounted volume.
//!
//! The traversal must survive hostile filesystems: unreadable directories,
//! vanished paths, permission walls. A listing that fails is a *tagged* empty
//! result, not an exception - one bad directory never aborts a whole-volume
//! search.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Direct children of one directory, files and subdirectories split apart.
#[derive(Debug, Default, Clone)]
pub struct Listing {
    pub files: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
}

/// Seam to the OS filesystem API.
pub trait Filesystem {
    /// Top-level paths of every mounted volume, queried fresh per call -
    /// volumes may appear or disappear between invocations.
    fn volume_roots(&self) -> Vec<PathBuf>;
    /// List the direct children of `dir`. An `Err` marks the whole directory
    /// as unreadable; the traversal treats it as empty and moves on.
    fn list(&self, dir: &Path) -> std::io::Result<Listing>;
}

/// Find a file named exactly `filename` somewhere on some volume.
///
/// Volumes are searched sequentially; within a volume the walk is
/// breadth-first from the root, so directories closer to a root are fully
/// checked before deeper ones. The first match ends the search globally, even
/// with volumes or directories still unvisited. Where several matches exist
/// the winner beyond "first volume processed, shallowest first" is
/// implementation-defined - it follows the OS enumeration order, which this
/// crate does not fix.
///
/// `None` is a valid terminal result, not a failure. Callers are expected to
/// reject empty or nonsensical filenames themselves; an empty name simply
/// finds nothing.
pub fn find_executable<F: Filesystem + ?Sized>(fs: &F, filename: &str) -> Option<PathBuf> {
    let target = std::ffi::OsStr::new(filename);
    for root in fs.volume_roots() {
        log::debug!("searching volume {}", root.display());
        // Fresh frontier per volume. Only ever grows with children of the
        // directory currently dequeued, which is what makes this BFS (and,
        // with finite trees, what makes it terminate).
        let mut frontier = VecDeque::new();
        frontier.push_back(root);
        while let Some(dir) = frontier.pop_front() {
            let listing = match fs.list(&dir) {
                Ok(listing) => listing,
                Err(e) => {
                    // Unreadable. Contributes nothing, search goes on.
                    log::debug!("skipping {}: {e}", dir.display());
                    continue;
                }
            };
            if let Some(found) = listing
                .files
                .into_iter()
                .find(|file| file.file_name() == Some(target))
            {
                return Some(found);
            }
            frontier.extend(listing.dirs);
        }
    }
    None
}

/// The live OS backend: volume roots from mount points, listings from
/// `read_dir`.
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn volume_roots(&self) -> Vec<PathBuf> {
        let disks = sysinfo::Disks::new_with_refreshed_list();
        let mut roots: Vec<PathBuf> = disks
            .iter()
            .map(|disk| disk.mount_point().to_path_buf())
            .collect();
        // Bind mounts and the like can repeat a mount point.
        roots.sort();
        roots.dedup();
        roots
    }

    fn list(&self, dir: &Path) -> std::io::Result<Listing> {
        let mut listing = Listing::default();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                listing.dirs.push(entry.path());
            } else if file_type.is_file() {
                listing.files.push(entry.path());
            }
            // Symlinks fall through both arms - following them could cycle.
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod test {
    use super::{find_executable, Filesystem, Listing};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    /// In-memory tree with designated unreadable directories and a visit log.
    #[derive(Default)]
    struct FakeFs {
        roots: Vec<PathBuf>,
        dirs: HashMap<PathBuf, Listing>,
        broken: Vec<PathBuf>,
        visits: RefCell<HashMap<PathBuf, u32>>,
    }

    impl FakeFs {
        fn root(mut self, path: &str) -> Self {
            self.roots.push(PathBuf::from(path));
            self.dirs.entry(PathBuf::from(path)).or_default();
            self
        }
        fn dir(mut self, path: &str, files: &[&str], dirs: &[&str]) -> Self {
            let path = PathBuf::from(path);
            let listing = Listing {
                files: files.iter().map(|f| path.join(f)).collect(),
                dirs: dirs.iter().map(|d| path.join(d)).collect(),
            };
            for sub in &listing.dirs {
                self.dirs.entry(sub.clone()).or_default();
            }
            self.dirs.insert(path, listing);
            self
        }
        /// Listing this directory fails. The entry under it (if any) must be
        /// unreachable through it.
        fn broken(mut self, path: &str) -> Self {
            self.broken.push(PathBuf::from(path));
            self
        }
    }

    impl Filesystem for FakeFs {
        fn volume_roots(&self) -> Vec<PathBuf> {
            self.roots.clone()
        }
        fn list(&self, dir: &Path) -> std::io::Result<Listing> {
            *self
                .visits
                .borrow_mut()
                .entry(dir.to_path_buf())
                .or_insert(0) += 1;
            if self.broken.iter().any(|b| b == dir) {
                return Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
            }
            Ok(self.dirs.get(dir).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn failing_decoy_is_skipped_not_fatal() {
        // Target hides at depth 3; a decoy at depth 1 refuses to be listed.
        let fs = FakeFs::default()
            .root("/v")
            .dir("/v", &[], &["decoy", "a"])
            .broken("/v/decoy")
            .dir("/v/a", &[], &["b"])
            .dir("/v/a/b", &[], &["c"])
            .dir("/v/a/b/c", &["target.exe"], &[]);

        assert_eq!(
            find_executable(&fs, "target.exe"),
            Some(PathBuf::from("/v/a/b/c/target.exe"))
        );
    }

    #[test]
    fn not_found_visits_everything_exactly_once() {
        let fs = FakeFs::default()
            .root("/v")
            .dir("/v", &["nope.txt"], &["a", "b"])
            .dir("/v/a", &[], &["deep"])
            .dir("/v/b", &["other.exe"], &[])
            .dir("/v/a/deep", &["also_not_it"], &[]);

        assert_eq!(find_executable(&fs, "target.exe"), None);

        let visits = fs.visits.borrow();
        for dir in fs.dirs.keys() {
            assert_eq!(
                visits.get(dir),
                Some(&1),
                "{} should be visited exactly once",
                dir.display()
            );
        }
    }

    #[test]
    fn first_volume_processed_wins() {
        let fs = FakeFs::default()
            .root("/first")
            .root("/second")
            .dir("/first", &[], &["sub"])
            .dir("/first/sub", &["target.exe"], &[])
            .dir("/second", &["target.exe"], &[]);

        // Deeper on the first volume still beats shallower on the second.
        assert_eq!(
            find_executable(&fs, "target.exe"),
            Some(PathBuf::from("/first/sub/target.exe"))
        );
    }

    #[test]
    fn shallow_match_beats_deep_match() {
        let fs = FakeFs::default()
            .root("/v")
            .dir("/v", &[], &["d1"])
            .dir("/v/d1", &["target.exe"], &["d2"])
            .dir("/v/d1/d2", &[], &["d3"])
            .dir("/v/d1/d2/d3", &[], &["d4"])
            .dir("/v/d1/d2/d3/d4", &[], &["d5"])
            .dir("/v/d1/d2/d3/d4/d5", &["target.exe"], &[]);

        assert_eq!(
            find_executable(&fs, "target.exe"),
            Some(PathBuf::from("/v/d1/target.exe"))
        );
    }

    #[test]
    fn siblings_checked_before_children() {
        // Both siblings of the root level come before any grandchild.
        let fs = FakeFs::default()
            .root("/v")
            .dir("/v", &[], &["a", "b"])
            .dir("/v/a", &[], &["deep"])
            .dir("/v/a/deep", &["target.exe"], &[])
            .dir("/v/b", &["target.exe"], &[]);

        assert_eq!(
            find_executable(&fs, "target.exe"),
            Some(PathBuf::from("/v/b/target.exe"))
        );
    }

    #[test]
    fn empty_name_finds_nothing() {
        let fs = FakeFs::default().root("/v").dir("/v", &["a.exe"], &[]);
        assert_eq!(find_executable(&fs, ""), None);
    }
}
