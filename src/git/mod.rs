//! Git configuration backed identity store.
//!
//! Reads and writes `user.name` / `user.email` by running `git config` in the
//! repository. Every git invocation is bounded by a timeout so a hung git
//! cannot freeze the caller; a timed out child is killed.

use crate::pairing::{CombinedIdentity, IdentityStore, Scope};
use crate::{Error, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default bound on a single git invocation.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

const NAME_KEY: &str = "user.name";
const EMAIL_KEY: &str = "user.email";

/// `git config` exits with 1 when a key is not set.
const EXIT_KEY_NOT_SET: i32 = 1;
/// `git config --unset` exits with 5 when there was nothing to unset.
const EXIT_NOTHING_TO_UNSET: i32 = 5;

/// Captured output of a finished git process.
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A git invocation with a working directory, extra environment and a timeout.
#[derive(Debug, Clone)]
pub struct GitRunner {
    repo_path: PathBuf,
    timeout: Duration,
    envs: Vec<(String, String)>,
}

impl GitRunner {
    pub fn new(repo_path: &Path) -> Self {
        Self {
            repo_path: repo_path.to_path_buf(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            envs: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set an environment variable for every git invocation.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Run git with the given arguments and capture its output.
    ///
    /// A non-zero exit is not an error here; callers decide what the exit code
    /// means. Failing to start git, or git outliving the timeout, is.
    pub fn run(&self, args: &[&str]) -> Result<GitOutput> {
        let command = args.join(" ");
        tracing::debug!(%command, repo = %self.repo_path.display(), "running git");

        let mut child = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Git {
                command: command.clone(),
                message: e.to_string(),
            })?;

        // drained while waiting so a full pipe cannot stall the child
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Timeout {
                    command,
                    millis: self.timeout.as_millis() as u64,
                });
            }
        };

        Ok(GitOutput {
            code: status.code(),
            stdout: collect(stdout)?,
            stderr: collect(stderr)?,
        })
    }

    /// Run git and fail unless it exits successfully.
    fn run_checked(&self, args: &[&str]) -> Result<GitOutput> {
        let output = self.run(args)?;
        if !output.success() {
            return Err(Error::Git {
                command: args.join(" "),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

/// Read a child pipe to the end on its own thread.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

fn collect(reader: Option<JoinHandle<std::io::Result<String>>>) -> Result<String> {
    let Some(reader) = reader else {
        return Ok(String::new());
    };
    let text = reader
        .join()
        .map_err(|_| Error::Other("git output reader panicked".to_string()))??;
    Ok(text)
}

/// Find the top level directory of the git work tree containing `path`.
///
/// Returns `Ok(None)` outside a work tree or when git cannot be started. A
/// git that outlives `timeout` is an error rather than "not a repository".
pub fn find_git_root(path: &Path, timeout: Duration) -> Result<Option<PathBuf>> {
    let output = match GitRunner::new(path)
        .with_timeout(timeout)
        .run(&["rev-parse", "--show-toplevel"])
    {
        Ok(output) => output,
        Err(e @ Error::Timeout { .. }) => return Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "git root detection unavailable");
            return Ok(None);
        }
    };
    if !output.success() {
        return Ok(None);
    }
    let root = output.stdout.trim();
    Ok((!root.is_empty()).then(|| PathBuf::from(root)))
}

/// [`IdentityStore`] that keeps the combined identity in git config.
#[derive(Debug, Clone)]
pub struct GitConfigStore {
    git: GitRunner,
}

impl GitConfigStore {
    /// Store for the repository at `repo_path`.
    pub fn new(repo_path: &Path) -> Self {
        Self::with_runner(GitRunner::new(repo_path))
    }

    pub fn with_runner(git: GitRunner) -> Self {
        Self { git }
    }

    /// Effective `user.email`.
    pub fn user_email(&self) -> Result<Option<String>> {
        self.get(EMAIL_KEY)
    }

    /// Effective `user.name`.
    pub fn user_name(&self) -> Result<Option<String>> {
        self.get(NAME_KEY)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let output = self.git.run(&["config", key])?;
        match output.code {
            Some(0) => {
                let value = output.stdout.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Some(EXIT_KEY_NOT_SET) => Ok(None),
            _ => Err(Error::Git {
                command: format!("config {}", key),
                message: output.stderr.trim().to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: &str, scope: Scope) -> Result<()> {
        match scope {
            Scope::Local => self.git.run_checked(&["config", key, value])?,
            Scope::Global => self.git.run_checked(&["config", "--global", key, value])?,
        };
        Ok(())
    }

    fn unset(&self, key: &str, scope: Scope) -> Result<()> {
        let output = match scope {
            Scope::Local => self.git.run(&["config", "--unset", key])?,
            Scope::Global => self.git.run(&["config", "--global", "--unset", key])?,
        };
        match output.code {
            Some(0) | Some(EXIT_NOTHING_TO_UNSET) => Ok(()),
            _ => Err(Error::Git {
                command: format!("config --unset {}", key),
                message: output.stderr.trim().to_string(),
            }),
        }
    }
}

impl IdentityStore for GitConfigStore {
    fn identity(&self) -> Result<Option<String>> {
        self.user_email()
    }

    fn set_identity(&self, identity: &CombinedIdentity, scope: Scope) -> Result<()> {
        let fields = [
            (NAME_KEY, identity.name.as_deref()),
            (EMAIL_KEY, identity.email.as_deref()),
        ];
        for (key, value) in fields {
            let Some(value) = value else { continue };
            self.set(key, value, scope)?;

            // the repository value would shadow the global one
            if scope == Scope::Global
                && let Err(e) = self.unset(key, Scope::Local)
            {
                tracing::debug!(key, error = %e, "could not remove local override");
            }
        }
        Ok(())
    }

    fn clear_identity(&self, scope: Scope) -> Result<()> {
        self.unset(NAME_KEY, scope)?;
        self.unset(EMAIL_KEY, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Temp repository plus an isolated global config file.
    struct TestRepo {
        repo: TempDir,
        home: TempDir,
    }

    impl TestRepo {
        fn new() -> Self {
            let repo = TempDir::new().unwrap();
            let home = TempDir::new().unwrap();
            let test = Self { repo, home };
            test.runner().run(&["init", "--quiet"]).unwrap();
            test
        }

        fn global_config(&self) -> PathBuf {
            self.home.path().join(".gitconfig")
        }

        fn runner(&self) -> GitRunner {
            GitRunner::new(self.repo.path())
                .with_timeout(Duration::from_secs(10))
                .with_env("HOME", self.home.path().display().to_string())
                .with_env("GIT_CONFIG_GLOBAL", self.global_config().display().to_string())
                .with_env("GIT_CONFIG_NOSYSTEM", "1")
        }

        fn store(&self) -> GitConfigStore {
            GitConfigStore::with_runner(self.runner())
        }

        fn get(&self, args: &[&str]) -> Option<String> {
            let output = self.runner().run(args).unwrap();
            output.success().then(|| output.stdout.trim().to_string())
        }
    }

    fn identity(name: Option<&str>, email: Option<&str>) -> CombinedIdentity {
        CombinedIdentity {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_get_user_email() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        let store = repo.store();
        assert_eq!(store.identity().unwrap(), None);

        repo.runner()
            .run(&["config", "user.email", "setup@example.com"])
            .unwrap();
        assert_eq!(
            store.identity().unwrap().as_deref(),
            Some("setup@example.com")
        );
    }

    #[test]
    fn test_set_identity_local() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        let store = repo.store();

        store
            .set_identity(
                &identity(Some("Test User Name & Stuff"), Some("test@example.com")),
                Scope::Local,
            )
            .unwrap();

        assert_eq!(
            store.user_name().unwrap().as_deref(),
            Some("Test User Name & Stuff")
        );
        assert_eq!(store.user_email().unwrap().as_deref(), Some("test@example.com"));
        assert_eq!(repo.get(&["config", "--global", "user.email"]), None);
    }

    #[test]
    fn test_set_identity_writes_only_defined_fields() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        let store = repo.store();

        store
            .set_identity(&identity(Some("Keep Me"), Some("old@example.com")), Scope::Local)
            .unwrap();
        store
            .set_identity(&identity(None, Some("new@example.com")), Scope::Local)
            .unwrap();

        assert_eq!(store.user_name().unwrap().as_deref(), Some("Keep Me"));
        assert_eq!(store.user_email().unwrap().as_deref(), Some("new@example.com"));
    }

    #[test]
    fn test_set_identity_global_unsets_local() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        let store = repo.store();
        repo.runner()
            .run(&["config", "user.email", "setup@example.com"])
            .unwrap();

        store
            .set_identity(
                &identity(Some("Global"), Some("global@example.com")),
                Scope::Global,
            )
            .unwrap();

        assert_eq!(repo.get(&["config", "--local", "user.email"]), None);
        assert_eq!(
            repo.get(&["config", "--global", "user.email"]).as_deref(),
            Some("global@example.com")
        );
        assert_eq!(
            store.identity().unwrap().as_deref(),
            Some("global@example.com")
        );
    }

    #[test]
    fn test_clear_identity() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        let store = repo.store();

        // nothing to clear is fine
        store.clear_identity(Scope::Local).unwrap();

        store
            .set_identity(&identity(Some("A"), Some("a@example.com")), Scope::Local)
            .unwrap();
        store.clear_identity(Scope::Local).unwrap();
        assert_eq!(store.user_name().unwrap(), None);
        assert_eq!(store.user_email().unwrap(), None);
    }

    #[test]
    fn test_find_git_root() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        let nested = repo.repo.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let root = find_git_root(&nested, Duration::from_secs(10))
            .unwrap()
            .unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            repo.repo.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_find_git_root_honors_timeout() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        assert!(matches!(
            find_git_root(repo.repo.path(), Duration::ZERO),
            Err(Error::Timeout { .. })
        ));
    }

    #[test]
    fn test_run_drains_large_output() {
        if !git_available() {
            return;
        }
        let repo = TestRepo::new();
        let big = "x".repeat(100_000);
        repo.runner()
            .run(&["config", "test.big", &big])
            .unwrap();

        let output = repo.runner().run(&["config", "test.big"]).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim().len(), big.len());
    }

    #[test]
    fn test_missing_directory_is_git_error() {
        let runner = GitRunner::new(Path::new("/definitely/not/a/real/path"));
        assert!(matches!(
            runner.run(&["status"]),
            Err(Error::Git { .. })
        ));
    }
}
