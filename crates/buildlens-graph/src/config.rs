use buildlens_core::path::{absolutize, ensure_trailing_slash, normalize_separators, split_folder_file, stable_hash64};
use std::path::Path;
use std::sync::Arc;

/// Where an include directive may resolve: the stack of parent directories
/// (nearest-enclosing file last), the `/I` user dirs, and the system dirs
/// from the project's IncludePath.
///
/// Configs are immutable. Descending into a header in another directory
/// produces a new value via [`SearchConfig::with_parent`], so sibling
/// directives never observe each other's pushes. The hash is a pure function
/// of the three ordered sequences and keys the per-node memoization; configs
/// with equal hash are interchangeable (collision risk accepted).
#[derive(Debug)]
pub struct SearchConfig {
    parents: Vec<String>,
    user_dirs: Vec<String>,
    system_dirs: Vec<String>,
    hash: u64,
}

impl SearchConfig {
    pub fn new(user_dirs: Vec<String>, system_dirs: Vec<String>) -> Arc<Self> {
        Self::build(Vec::new(), user_dirs, system_dirs)
    }

    /// Config for scanning a root file. Seeds the parent stack with the
    /// file's own directory: quoted includes search the including file's
    /// directory first.
    pub fn for_root(
        root_file: &str,
        user_dirs: Vec<String>,
        system_dirs: Vec<String>,
    ) -> Arc<Self> {
        let (folder, _) = split_folder_file(&normalize_separators(root_file));
        Self::build(vec![folder], user_dirs, system_dirs)
    }

    /// Copy-on-push: a new config with `dir` as the nearest enclosing parent.
    /// A directory already on the stack moves to the top instead of being
    /// pushed again; the including file's own directory must always be the
    /// first searched, and duplicating entries would grow the stack without
    /// bound on mutual includes across directories. The stack stays a set of
    /// the directories seen, so cycles reach a fixed point of configs and the
    /// per-node memoization terminates them.
    pub fn with_parent(self: &Arc<Self>, dir: &str) -> Arc<Self> {
        let dir = ensure_trailing_slash(normalize_separators(dir));
        if self.parents.last() == Some(&dir) {
            return Arc::clone(self);
        }
        let mut parents = self.parents.clone();
        parents.retain(|p| p != &dir);
        parents.push(dir);
        Self::build(parents, self.user_dirs.clone(), self.system_dirs.clone())
    }

    fn build(parents: Vec<String>, user_dirs: Vec<String>, system_dirs: Vec<String>) -> Arc<Self> {
        let parents = normalize_dirs(parents);
        let user_dirs = normalize_dirs(user_dirs);
        let system_dirs = normalize_dirs(system_dirs);

        let mut concat = String::new();
        for dir in parents.iter().chain(&user_dirs).chain(&system_dirs) {
            concat.push_str(dir);
        }
        let hash = stable_hash64(&concat);

        Arc::new(Self {
            parents,
            user_dirs,
            system_dirs,
            hash,
        })
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn user_dirs(&self) -> &[String] {
        &self.user_dirs
    }

    pub fn system_dirs(&self) -> &[String] {
        &self.system_dirs
    }

    /// Resolve an include directive to the first existing file, following
    /// the compiler's order. Quoted form: parent stack from last-pushed to
    /// first, then user dirs, then system dirs. Angle form: user dirs then
    /// system dirs only.
    pub fn find_header(&self, include: &str, quoted: bool) -> Option<String> {
        if quoted {
            for dir in self.parents.iter().rev() {
                if let Some(found) = existing(include, dir) {
                    return Some(found);
                }
            }
        }
        for dir in self.user_dirs.iter().chain(&self.system_dirs) {
            if let Some(found) = existing(include, dir) {
                return Some(found);
            }
        }
        None
    }
}

fn existing(include: &str, dir: &str) -> Option<String> {
    let candidate = absolutize(include, dir);
    Path::new(&candidate).is_file().then_some(candidate)
}

fn normalize_dirs(dirs: Vec<String>) -> Vec<String> {
    dirs.into_iter()
        .map(|d| ensure_trailing_slash(normalize_separators(&d)))
        .collect()
}
