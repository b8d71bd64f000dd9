use super::{
    BranchInfo, RemoteEntry, RemoteStore, RepositoryInfo, StoreError, StoreErrorKind,
    StoreResult, WriteReceipt,
};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Clone)]
struct StoredEntry {
    content: String,
    version: String,
}

/// In-memory remote store for testing.
///
/// Uses `RefCell` for interior mutability since publishing is single-threaded,
/// which keeps the `RemoteStore` methods on `&self` like a real client.
///
/// Failures are injected per path ([`MemStore::fail_path`]) or globally
/// ([`MemStore::fail_all`]); [`MemStore::simulate_concurrent_edit`] makes the
/// next read of a path hand out a token that is already stale.
pub struct MemStore {
    branches: RefCell<BTreeSet<String>>,
    entries: RefCell<BTreeMap<(String, String), StoredEntry>>,
    path_failures: RefCell<HashMap<String, StoreError>>,
    global_failure: RefCell<Option<StoreError>>,
    concurrent_edits: RefCell<BTreeSet<String>>,
    next_version: Cell<u64>,
    writes: Cell<usize>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self {
            branches: RefCell::new(BTreeSet::from(["main".to_string()])),
            entries: RefCell::new(BTreeMap::new()),
            path_failures: RefCell::new(HashMap::new()),
            global_failure: RefCell::new(None),
            concurrent_edits: RefCell::new(BTreeSet::new()),
            next_version: Cell::new(1),
            writes: Cell::new(0),
        }
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_branch(&self, name: &str) {
        self.branches.borrow_mut().insert(name.to_string());
    }

    /// Seeds an entry without counting it as a write.
    pub fn insert(&self, branch: &str, path: &str, content: &str) -> String {
        let version = self.mint_version();
        self.entries.borrow_mut().insert(
            (branch.to_string(), path.to_string()),
            StoredEntry {
                content: content.to_string(),
                version: version.clone(),
            },
        );
        version
    }

    pub fn content(&self, branch: &str, path: &str) -> Option<String> {
        self.entries
            .borrow()
            .get(&(branch.to_string(), path.to_string()))
            .map(|e| e.content.clone())
    }

    pub fn version(&self, branch: &str, path: &str) -> Option<String> {
        self.entries
            .borrow()
            .get(&(branch.to_string(), path.to_string()))
            .map(|e| e.version.clone())
    }

    /// Number of successful creates and updates.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Every call touching `path` fails with `error` until cleared.
    pub fn fail_path(&self, path: &str, error: StoreError) {
        self.path_failures
            .borrow_mut()
            .insert(path.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.path_failures.borrow_mut().clear();
        *self.global_failure.borrow_mut() = None;
    }

    /// Every call fails with `error` until cleared.
    pub fn fail_all(&self, error: StoreError) {
        *self.global_failure.borrow_mut() = Some(error);
    }

    /// After the next read of `path`, bump its version behind the reader's back.
    pub fn simulate_concurrent_edit(&self, path: &str) {
        self.concurrent_edits.borrow_mut().insert(path.to_string());
    }

    fn mint_version(&self) -> String {
        let n = self.next_version.get();
        self.next_version.set(n + 1);
        format!("v{}", n)
    }

    fn check_failure(&self, path: Option<&str>) -> StoreResult<()> {
        if let Some(err) = self.global_failure.borrow().as_ref() {
            return Err(err.clone());
        }
        if let Some(path) = path {
            if let Some(err) = self.path_failures.borrow().get(path) {
                return Err(err.clone());
            }
        }
        Ok(())
    }

    fn check_branch(&self, branch: &str) -> StoreResult<()> {
        if self.branches.borrow().contains(branch) {
            Ok(())
        } else {
            Err(StoreError::not_found(format!("No commit found for the ref {}", branch)))
        }
    }

    fn reference(branch: &str, path: &str) -> String {
        format!("memory://{}/{}", branch, path)
    }

    fn write(&self, branch: &str, path: &str, content: &str) -> WriteReceipt {
        let version = self.mint_version();
        self.entries.borrow_mut().insert(
            (branch.to_string(), path.to_string()),
            StoredEntry {
                content: content.to_string(),
                version: version.clone(),
            },
        );
        self.writes.set(self.writes.get() + 1);
        WriteReceipt {
            reference: Self::reference(branch, path),
            version,
        }
    }
}

impl RemoteStore for MemStore {
    fn get_entry(&self, path: &str, git_ref: &str) -> StoreResult<RemoteEntry> {
        self.check_failure(Some(path))?;
        self.check_branch(git_ref)?;

        let key = (git_ref.to_string(), path.to_string());
        let entry = self
            .entries
            .borrow()
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("{} does not exist", path)))?;

        if self.concurrent_edits.borrow_mut().remove(path) {
            let bumped = self.mint_version();
            if let Some(stored) = self.entries.borrow_mut().get_mut(&key) {
                stored.version = bumped;
            }
        }

        Ok(RemoteEntry {
            content: entry.content,
            version: entry.version,
        })
    }

    fn create_entry(
        &self,
        path: &str,
        _message: &str,
        content: &str,
        branch: &str,
    ) -> StoreResult<WriteReceipt> {
        self.check_failure(Some(path))?;
        self.check_branch(branch)?;

        if self
            .entries
            .borrow()
            .contains_key(&(branch.to_string(), path.to_string()))
        {
            return Err(StoreError::new(
                StoreErrorKind::Unprocessable,
                format!("{} already exists and no version was supplied", path),
            ));
        }
        Ok(self.write(branch, path, content))
    }

    fn update_entry(
        &self,
        path: &str,
        _message: &str,
        content: &str,
        version: &str,
        branch: &str,
    ) -> StoreResult<WriteReceipt> {
        self.check_failure(Some(path))?;
        self.check_branch(branch)?;

        let current = self.version(branch, path).ok_or_else(|| {
            StoreError::not_found(format!("{} does not exist", path))
        })?;
        if current != version {
            return Err(StoreError::new(
                StoreErrorKind::Conflict,
                format!("{} is at {} but {} was supplied", path, current, version),
            ));
        }
        Ok(self.write(branch, path, content))
    }

    fn get_branch(&self, name: &str) -> StoreResult<BranchInfo> {
        self.check_failure(None)?;
        self.check_branch(name)?;
        Ok(BranchInfo {
            name: name.to_string(),
            head: format!("head-{}", self.next_version.get()),
        })
    }

    fn repository(&self) -> StoreResult<RepositoryInfo> {
        self.check_failure(None)?;
        Ok(RepositoryInfo {
            full_name: "memory/site".to_string(),
            default_branch: "main".to_string(),
        })
    }

    fn list_dir(&self, path: &str, git_ref: &str) -> StoreResult<Vec<String>> {
        self.check_failure(Some(path))?;
        self.check_branch(git_ref)?;

        let prefix = format!("{}/", path.trim_end_matches('/'));
        let names: Vec<String> = self
            .entries
            .borrow()
            .keys()
            .filter(|(branch, _)| branch == git_ref)
            .filter_map(|(_, p)| p.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            return Err(StoreError::not_found(format!("{} does not exist", path)));
        }
        Ok(names)
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::config::PublishSettings;
    use crate::reconcile::DuplicatePolicy;

    pub const POSTS_DIR: &str = "_posts";

    /// Complete settings matching a fresh `MemStore`.
    pub fn settings() -> PublishSettings {
        PublishSettings {
            token: "test-token".to_string(),
            owner: "memory".to_string(),
            repo: "site".to_string(),
            branch: "main".to_string(),
            posts_dir: POSTS_DIR.to_string(),
            api_base: "https://api.github.com".to_string(),
            duplicates: DuplicatePolicy::Reject,
        }
    }

    pub struct StoreFixture {
        pub store: MemStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: MemStore::new(),
            }
        }

        /// Seeds `_posts/<identifier>` on `main`.
        pub fn with_post(self, identifier: &str, content: &str) -> Self {
            self.store
                .insert("main", &format!("{}/{}", POSTS_DIR, identifier), content);
            self
        }

        /// Makes every call touching `_posts/<identifier>` fail.
        pub fn with_failing_post(self, identifier: &str, kind: StoreErrorKind) -> Self {
            self.store.fail_path(
                &format!("{}/{}", POSTS_DIR, identifier),
                StoreError::new(kind, "injected failure"),
            );
            self
        }
    }
}
