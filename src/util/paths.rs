use std::env;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use crate::error::{FtpVaultError, Result};

/// Canonical remote form: forward slashes, one leading slash, no trailing
/// slash except for the root itself.
pub fn normalize_remote(path: &str) -> String {
    let mut p: String = path
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '\\' { '/' } else { c })
        .collect();
    if !p.starts_with('/') {
        p.insert(0, '/');
    }
    while p.len() > 1 && p.ends_with('/') {
        p.pop();
    }
    p
}

/// Joins a child name onto a normalized remote directory.
pub fn join_remote(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

pub fn remote_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Name usable as exactly one local path segment.
pub fn is_safe_segment(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    !name
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
}

pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Ok(home) = env::var("HOME") {
            return Path::new(&home).join(path.trim_start_matches('~').trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}

/// Resolves `relative` (a remote-style path) under `root` and refuses any
/// result that is not `root` itself or below it. Touches nothing on disk
/// apart from canonicalizing ancestors that already exist.
pub fn resolve_local(root: &Path, relative: &str) -> Result<PathBuf> {
    let rel = relative.replace('/', &MAIN_SEPARATOR.to_string());
    let rel = rel.trim_start_matches(MAIN_SEPARATOR);
    let base = absolutize(root)?;
    let out = absolutize(&base.join(rel))?;
    if out != base && !out.starts_with(&base) {
        return Err(FtpVaultError::PathEscape(relative.to_string()));
    }
    Ok(out)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };

    let mut existing = PathBuf::new();
    let mut rest = Vec::new();
    for component in path.components() {
        if rest.is_empty() {
            let candidate = existing.join(component);
            if matches!(component, Component::RootDir | Component::Prefix(_))
                || (component != Component::ParentDir && candidate.exists())
            {
                existing = candidate;
                continue;
            }
        }
        rest.push(component);
    }

    let mut out = existing.canonicalize().unwrap_or(existing);
    for component in rest {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}
