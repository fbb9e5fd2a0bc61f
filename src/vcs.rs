// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, info, warn};

use crate::error::VcsError;

/// Remote added by [`GitStorage::init`] and pushed to when no upstream is set
const REMOTE: &str = "origin";

/// Commit/pull/push synchronization of the store directory
pub trait VersionedStorage {
    /// Integrate remote changes into the working copy
    fn pull(&self) -> Result<(), VcsError>;

    /// Record the current working copy with `message`
    fn commit(&self, message: &str) -> Result<(), VcsError>;

    /// Publish local commits to the remote
    fn push(&self) -> Result<(), VcsError>;
}

impl<V: VersionedStorage + ?Sized> VersionedStorage for Box<V> {
    fn pull(&self) -> Result<(), VcsError> {
        (**self).pull()
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        (**self).commit(message)
    }

    fn push(&self) -> Result<(), VcsError> {
        (**self).push()
    }
}

/// Storage without version control: pulls and commits do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct Unversioned;

impl VersionedStorage for Unversioned {
    fn pull(&self) -> Result<(), VcsError> {
        Ok(())
    }

    fn commit(&self, _message: &str) -> Result<(), VcsError> {
        Ok(())
    }

    fn push(&self) -> Result<(), VcsError> {
        Err(VcsError::Remote(
            "the store is not tracked with git".to_string(),
        ))
    }
}

/// Git repository in the store directory, driven through the `git` binary
#[derive(Debug, Clone)]
pub struct GitStorage {
    work_dir: PathBuf,
}

impl GitStorage {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// Whether `dir` is the root of a git working copy
    pub fn is_repository(dir: &Path) -> bool {
        dir.join(".git").exists()
    }

    /// `git init` the store directory, optionally adding `origin`
    pub fn init(work_dir: impl Into<PathBuf>, remote: Option<&str>) -> Result<Self, VcsError> {
        let storage = Self::new(work_dir);
        storage.git(&["init"])?;
        if let Some(url) = remote {
            storage.git(&["remote", "add", REMOTE, url])?;
        }
        info!(path = %storage.work_dir.display(), "initialized git repository");
        Ok(storage)
    }

    /// Run an arbitrary git command in the store and return its stdout
    pub fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        let output = self.git(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn has_remote(&self) -> Result<bool, VcsError> {
        let output = self.git(&["remote"])?;
        Ok(!output.stdout.trim_ascii().is_empty())
    }

    /// Whether the current branch tracks a remote branch
    fn has_upstream(&self) -> Result<bool, VcsError> {
        let output = self.raw(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])?;
        Ok(output.status.success())
    }

    /// Name of the checked out branch, also before its first commit
    fn current_branch(&self) -> Result<String, VcsError> {
        let output = self.git(&["symbolic-ref", "--short", "HEAD"])?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Whether `origin` already has `branch`
    fn remote_has_branch(&self, branch: &str) -> Result<bool, VcsError> {
        let output = self.raw(&["ls-remote", "--exit-code", "--heads", REMOTE, branch])?;
        match output.status.code() {
            Some(0) => Ok(true),
            // ls-remote --exit-code reports "no matching refs" as 2
            Some(2) => Ok(false),
            _ => Err(VcsError::CommandFailed {
                command: format!("ls-remote {REMOTE} {branch}"),
                stderr: failure_text(&output),
            }),
        }
    }

    fn conflicted_files(&self) -> Vec<String> {
        self.raw(&["diff", "--name-only", "--diff-filter=U"])
            .ok()
            .filter(|o| o.status.success())
            .map(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .lines()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn raw(&self, args: &[&str]) -> Result<Output, VcsError> {
        debug!(?args, "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .map_err(|e| VcsError::SpawnFailed {
                command: args.join(" "),
                source: e,
            })
    }

    fn git(&self, args: &[&str]) -> Result<Output, VcsError> {
        let output = self.raw(args)?;
        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command: args.join(" "),
                stderr: failure_text(&output),
            });
        }
        Ok(output)
    }
}

impl VersionedStorage for GitStorage {
    fn pull(&self) -> Result<(), VcsError> {
        if !self.has_remote()? {
            debug!("no git remote configured, skipping pull");
            return Ok(());
        }

        let output = if self.has_upstream()? {
            self.raw(&["pull", "--no-rebase", "--no-edit"])?
        } else {
            let branch = self.current_branch()?;
            if !self.remote_has_branch(&branch)? {
                debug!(%branch, "remote has no copy of the branch yet, skipping pull");
                return Ok(());
            }
            self.raw(&["pull", "--no-rebase", "--no-edit", REMOTE, &branch])?
        };
        if output.status.success() {
            return Ok(());
        }

        let conflicts = self.conflicted_files();
        let text = failure_text(&output);
        if !conflicts.is_empty() || text.contains("CONFLICT") {
            warn!(files = ?conflicts, "pull left merge conflicts");
            let detail = if conflicts.is_empty() {
                text
            } else {
                conflicts.join(", ")
            };
            return Err(VcsError::Conflict(detail));
        }

        Err(VcsError::CommandFailed {
            command: "pull".to_string(),
            stderr: text,
        })
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.git(&["add", "--all"])?;

        let staged = self.raw(&["diff", "--cached", "--quiet"])?;
        if staged.status.success() {
            debug!("nothing to commit");
            return Ok(());
        }

        self.git(&["commit", "--quiet", "-m", message])?;
        info!(commit_message = message, "committed store changes");
        Ok(())
    }

    fn push(&self) -> Result<(), VcsError> {
        if !self.has_remote()? {
            return Err(VcsError::Remote("no git remote configured".to_string()));
        }
        let output = if self.has_upstream()? {
            self.raw(&["push"])?
        } else {
            self.raw(&["push", "--set-upstream", REMOTE, "HEAD"])?
        };
        if !output.status.success() {
            return Err(VcsError::Remote(failure_text(&output)));
        }
        Ok(())
    }
}

fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if stderr.trim().is_empty() { stdout } else { stderr };
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn git_available() -> bool {
        Command::new("git").arg("--version").output().is_ok()
    }

    fn configure_identity(storage: &GitStorage) {
        storage.run(&["config", "user.email", "test@example.com"]).unwrap();
        storage.run(&["config", "user.name", "Test"]).unwrap();
    }

    #[test]
    fn unversioned_pull_and_commit_are_no_ops() {
        assert!(Unversioned.pull().is_ok());
        assert!(Unversioned.commit("anything").is_ok());
        assert!(matches!(Unversioned.push(), Err(VcsError::Remote(_))));
    }

    #[test]
    fn boxed_storage_delegates() {
        let storage: Box<dyn VersionedStorage> = Box::new(Unversioned);
        assert!(storage.pull().is_ok());
    }

    #[test]
    fn git_commit_records_changes() {
        if !git_available() {
            return;
        }
        let dir = tempdir().unwrap();
        let storage = GitStorage::init(dir.path(), None).unwrap();
        configure_identity(&storage);
        assert!(GitStorage::is_repository(dir.path()));

        std::fs::write(dir.path().join("pod-store.json"), "{}\n").unwrap();
        storage.commit("Initialized store.").unwrap();

        let log = storage.run(&["log", "--format=%s"]).unwrap();
        assert_eq!(log.trim(), "Initialized store.");
    }

    #[test]
    fn git_commit_without_changes_is_ok() {
        if !git_available() {
            return;
        }
        let dir = tempdir().unwrap();
        let storage = GitStorage::init(dir.path(), None).unwrap();
        configure_identity(&storage);
        std::fs::write(dir.path().join("pod-store.json"), "{}\n").unwrap();
        storage.commit("first").unwrap();

        assert!(storage.commit("second").is_ok());
        let log = storage.run(&["log", "--format=%s"]).unwrap();
        assert_eq!(log.lines().count(), 1);
    }

    fn git_in(dir: &Path, args: &[&str]) {
        let output = Command::new("git").args(args).current_dir(dir).output().unwrap();
        assert!(output.status.success(), "git {args:?}: {}", failure_text(&output));
    }

    fn bare_remote(root: &Path) -> PathBuf {
        let remote = root.join("remote.git");
        std::fs::create_dir_all(&remote).unwrap();
        git_in(&remote, &["init", "--bare", "--quiet"]);
        remote
    }

    fn clone_of(remote: &Path, dir: &Path) -> GitStorage {
        let parent = dir.parent().unwrap();
        git_in(
            parent,
            &["clone", "--quiet", remote.to_str().unwrap(), dir.to_str().unwrap()],
        );
        let storage = GitStorage::new(dir);
        configure_identity(&storage);
        storage
    }

    fn write_store(storage: &GitStorage, content: &str) {
        std::fs::write(storage.work_dir.join("pod-store.json"), content).unwrap();
    }

    #[test]
    fn fresh_remote_without_upstream_pulls_and_pushes() {
        if !git_available() {
            return;
        }
        let root = tempdir().unwrap();
        let remote = bare_remote(root.path());
        let remote_url = remote.to_str().unwrap();

        let first = GitStorage::init(root.path().join("first"), Some(remote_url)).unwrap();
        configure_identity(&first);
        write_store(&first, "{}\n");
        first.commit("Initialized store.").unwrap();

        // origin is still empty and nothing tracks it yet
        first.pull().unwrap();
        first.push().unwrap();
        assert!(first.has_upstream().unwrap());
        first.pull().unwrap();

        // A second store pointed at the same remote starts from its content
        let second = GitStorage::init(root.path().join("second"), Some(remote_url)).unwrap();
        configure_identity(&second);
        second.pull().unwrap();
        assert_eq!(
            std::fs::read_to_string(root.path().join("second/pod-store.json")).unwrap(),
            "{}\n"
        );

        write_store(&second, "{\"a\": 1}\n");
        second.commit("Added podcast: a.").unwrap();
        second.push().unwrap();

        first.pull().unwrap();
        let log = first.run(&["log", "--format=%s"]).unwrap();
        assert_eq!(log.lines().next(), Some("Added podcast: a."));
    }

    #[test]
    fn diverging_store_edits_are_a_conflict() {
        if !git_available() {
            return;
        }
        let root = tempdir().unwrap();
        let remote = bare_remote(root.path());

        let first = GitStorage::init(root.path().join("first"), Some(remote.to_str().unwrap()))
            .unwrap();
        configure_identity(&first);
        write_store(&first, "{\n  \"podcast\": \"base\"\n}\n");
        first.commit("Initialized store.").unwrap();
        first.push().unwrap();

        let second = clone_of(&remote, &root.path().join("second"));
        write_store(&second, "{\n  \"podcast\": \"theirs\"\n}\n");
        second.commit("Renamed podcast: base -> theirs.").unwrap();
        second.push().unwrap();

        write_store(&first, "{\n  \"podcast\": \"ours\"\n}\n");
        first.commit("Renamed podcast: base -> ours.").unwrap();

        match first.pull() {
            Err(VcsError::Conflict(files)) => assert!(files.contains("pod-store.json")),
            other => panic!("expected a conflict, got {other:?}"),
        }
        assert_eq!(first.conflicted_files(), vec!["pod-store.json".to_string()]);

        // Unresolved files keep blocking later pulls
        assert!(matches!(first.pull(), Err(VcsError::Conflict(_))));
    }

    #[test]
    fn git_pull_without_remote_is_skipped_and_push_fails() {
        if !git_available() {
            return;
        }
        let dir = tempdir().unwrap();
        let storage = GitStorage::init(dir.path(), None).unwrap();

        assert!(storage.pull().is_ok());
        assert!(matches!(storage.push(), Err(VcsError::Remote(_))));
    }
}
