use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{FtpVaultError, Result};
use crate::remote::{FtpSession, RemoteFileClient};
use crate::types::{ItemErrorPolicy, RunMode};
use crate::util::paths::{join_remote, resolve_local};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub remote: String,
    pub local: PathBuf,
    /// `None` when the file was only logged (dry run).
    pub bytes: Option<u64>,
}

#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub transfers: Vec<Transfer>,
    pub directories: Vec<String>,
    pub skipped: Vec<String>,
}

pub struct TreeWalk<'a, S: FtpSession> {
    client: &'a mut RemoteFileClient<S>,
    dest_root: &'a Path,
    include_subdirs: bool,
    run_mode: RunMode,
    max_depth: usize,
    on_item_error: ItemErrorPolicy,
    visited: HashSet<String>,
    failures: Vec<FtpVaultError>,
    outcome: WalkOutcome,
}

impl<'a, S: FtpSession> TreeWalk<'a, S> {
    pub fn new(
        client: &'a mut RemoteFileClient<S>,
        dest_root: &'a Path,
        include_subdirs: bool,
        run_mode: RunMode,
        max_depth: usize,
        on_item_error: ItemErrorPolicy,
    ) -> Self {
        Self {
            client,
            dest_root,
            include_subdirs,
            run_mode,
            max_depth,
            on_item_error,
            visited: HashSet::new(),
            failures: Vec::new(),
            outcome: WalkOutcome::default(),
        }
    }

    pub fn is_directory(&mut self, remote: &str) -> bool {
        self.client.is_directory(remote)
    }

    /// Mirrors `remote_dir` into the destination under `rel_prefix`.
    pub fn walk_dir(&mut self, remote_dir: &str, rel_prefix: &str, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(FtpVaultError::Traversal(format!(
                "{} (deeper than {} levels)",
                remote_dir, self.max_depth
            )));
        }
        if !self.visited.insert(remote_dir.to_string()) {
            return Err(FtpVaultError::Traversal(format!("{} (already visited)", remote_dir)));
        }
        info!("entering folder: {}", remote_dir);
        self.outcome.directories.push(remote_dir.to_string());

        for name in self.client.list_entries(remote_dir) {
            let remote_child = join_remote(remote_dir, &name);
            let rel_child = format!("{}/{}", rel_prefix, name)
                .trim_start_matches('/')
                .to_string();
            if self.client.is_directory(&remote_child) {
                if self.include_subdirs {
                    self.walk_dir(&remote_child, &rel_child, depth + 1)?;
                } else {
                    debug!("skipping folder (subfolders disabled): {}", remote_child);
                    self.outcome.skipped.push(remote_child);
                }
                continue;
            }
            self.copy_file(&remote_child, &rel_child)?;
        }
        Ok(())
    }

    /// Saves one file; whether a failure ends the walk depends on the policy.
    pub fn copy_file(&mut self, remote: &str, rel: &str) -> Result<()> {
        match self.save(remote, rel) {
            Ok(transfer) => {
                self.outcome.transfers.push(transfer);
                Ok(())
            }
            Err(err) if self.on_item_error == ItemErrorPolicy::Continue => {
                warn!("skipping {}: {}", remote, err);
                self.failures.push(err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn save(&mut self, remote: &str, rel: &str) -> Result<Transfer> {
        let target = resolve_local(self.dest_root, rel)?;
        if self.run_mode.dry_run {
            info!("dry-run: would download {} -> {}", remote, target.display());
            return Ok(Transfer {
                remote: remote.to_string(),
                local: target,
                bytes: None,
            });
        }
        let bytes = self.client.download_file(remote, &target)?;
        info!("downloaded: {} -> {} ({} bytes)", remote, target.display(), bytes);
        Ok(Transfer {
            remote: remote.to_string(),
            local: target,
            bytes: Some(bytes),
        })
    }

    pub fn finish(self) -> Result<WalkOutcome> {
        let mut failures = self.failures.into_iter();
        match failures.next() {
            None => Ok(self.outcome),
            Some(first) => Err(FtpVaultError::Incomplete {
                failed: 1 + failures.count(),
                first: first.to_string(),
            }),
        }
    }
}
