use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::model::Profile;
use crate::error::{FtpVaultError, Result};
use crate::remote::session::{FtpConnection, FtpSession};

/// A logged-in connection plus the listing/transfer rules the backup walk
/// relies on. Closing happens on drop if not done explicitly.
pub struct RemoteFileClient<S: FtpSession> {
    session: Option<S>,
}

impl RemoteFileClient<FtpConnection> {
    pub fn connect(profile: &Profile, timeout: Duration) -> Result<Self> {
        let session = FtpConnection::open(profile, timeout)
            .map_err(|e| FtpVaultError::Connection(e.to_string()))?;
        Ok(Self::from_session(session))
    }
}

impl<S: FtpSession> RemoteFileClient<S> {
    pub fn from_session(session: S) -> Self {
        Self {
            session: Some(session),
        }
    }

    fn session(&mut self) -> Result<&mut S> {
        self.session
            .as_mut()
            .ok_or_else(|| FtpVaultError::Connection("connection already closed".to_string()))
    }

    pub fn pwd(&mut self) -> Result<String> {
        self.session()?
            .pwd()
            .map_err(|e| FtpVaultError::Connection(e.to_string()))
    }

    /// Probes with CWD and always tries to go back to where it started.
    pub fn is_directory(&mut self, path: &str) -> bool {
        let Ok(session) = self.session() else {
            return false;
        };
        let Ok(current) = session.pwd() else {
            return false;
        };
        match session.cwd(path) {
            Ok(()) => match session.cwd(&current) {
                Ok(()) => true,
                Err(err) => {
                    warn!("could not return to {} after probing {}: {}", current, path, err);
                    let _ = session.cwd(&current);
                    false
                }
            },
            Err(_) => {
                let _ = session.cwd(&current);
                false
            }
        }
    }

    /// Child names of `path`, never `.` or `..`. An unreadable directory
    /// yields an empty list.
    pub fn list_entries(&mut self, path: &str) -> Vec<String> {
        let Ok(session) = self.session() else {
            return Vec::new();
        };
        match session.mlsd(path) {
            Ok(lines) => return parse_mlsd(&lines),
            Err(err) => debug!("MLSD {} failed, falling back to NLST: {}", path, err),
        }
        match session.nlst(path) {
            Ok(names) => parse_nlst(&names),
            Err(err) => {
                let err = FtpVaultError::Listing {
                    path: path.to_string(),
                    message: err.to_string(),
                };
                warn!("{}; treating as empty", err);
                Vec::new()
            }
        }
    }

    pub fn download_file(&mut self, remote: &str, local: &Path) -> Result<u64> {
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent)?;
        }
        let transfer_err = |message: String| FtpVaultError::Transfer {
            remote: remote.to_string(),
            message,
        };
        let file = File::create(local).map_err(|e| transfer_err(e.to_string()))?;
        let mut out = BufWriter::new(file);
        let copied = self
            .session()?
            .retr(remote, &mut out)
            .map_err(|e| transfer_err(e.to_string()))?;
        out.flush().map_err(|e| transfer_err(e.to_string()))?;
        Ok(copied)
    }

    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(err) = session.quit() {
                debug!("QUIT failed, dropping connection: {}", err);
            }
        }
    }
}

impl<S: FtpSession> Drop for RemoteFileClient<S> {
    fn drop(&mut self) {
        self.close();
    }
}

fn parse_mlsd(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let line = line.trim_end_matches(['\r', '\n']);
            // facts end at the first space; a fact-less line is just the name
            let name = match line.split_once(' ') {
                Some((facts, name)) if facts.ends_with(';') => name,
                _ => line.trim_start(),
            };
            (!name.is_empty() && name != "." && name != "..").then(|| name.to_string())
        })
        .collect()
}

fn parse_nlst(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for raw in names {
        let raw = raw.trim_end_matches(['\r', '\n']).replace('\\', "/");
        let name = raw.rsplit('/').next().unwrap_or_default();
        if name.is_empty() || name == "." || name == ".." {
            continue;
        }
        if seen.insert(name.to_string()) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::LocalSession;

    #[test]
    fn mlsd_lines_yield_names() {
        let lines = vec![
            "type=cdir;modify=20240101000000; .".to_string(),
            "type=pdir; ..".to_string(),
            "type=file;size=12; notes with space.txt".to_string(),
            "type=dir;perm=el; logs".to_string(),
        ];
        assert_eq!(parse_mlsd(&lines), vec!["notes with space.txt", "logs"]);
    }

    #[test]
    fn nlst_fallback_deduplicates_basenames_in_order() {
        let names = vec![
            "/srv/b.txt".to_string(),
            "a.txt".to_string(),
            "srv\\b.txt".to_string(),
            "/srv/.".to_string(),
            "c.txt".to_string(),
            "/other/a.txt".to_string(),
        ];
        assert_eq!(parse_nlst(&names), vec!["b.txt", "a.txt", "c.txt"]);
    }

    #[test]
    fn list_entries_falls_back_when_mlsd_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("srv")).expect("mkdir");
        fs::write(dir.path().join("srv/b.txt"), "b").expect("write");
        let mut session = LocalSession::new(dir.path());
        session.fail_mlsd = true;
        session.nlst_override = Some(vec![
            "/srv/b.txt".to_string(),
            "/srv/a.txt".to_string(),
            "/srv/b.txt".to_string(),
        ]);
        let mut client = RemoteFileClient::from_session(session);
        assert_eq!(client.list_entries("/srv"), vec!["b.txt", "a.txt"]);
    }

    #[test]
    fn list_entries_is_empty_when_both_strategies_fail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = LocalSession::new(dir.path());
        session.fail_mlsd = true;
        session.fail_nlst = true;
        let mut client = RemoteFileClient::from_session(session);
        assert!(client.list_entries("/").is_empty());
    }

    #[test]
    fn is_directory_restores_working_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("srv/logs")).expect("mkdir");
        fs::write(dir.path().join("srv/file.txt"), "x").expect("write");
        let mut client = RemoteFileClient::from_session(LocalSession::new(dir.path()));

        assert!(client.is_directory("/srv/logs"));
        assert_eq!(client.pwd().expect("pwd"), "/");
        assert!(!client.is_directory("/srv/file.txt"));
        assert!(!client.is_directory("/missing"));
        assert_eq!(client.pwd().expect("pwd"), "/");
    }

    #[test]
    fn download_overwrites_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let remote = dir.path().join("remote");
        fs::create_dir_all(&remote).expect("mkdir");
        fs::write(remote.join("save.bin"), b"fresh").expect("write");
        let local = dir.path().join("local/nested/save.bin");
        fs::create_dir_all(local.parent().expect("parent")).expect("mkdir");
        fs::write(&local, b"stale contents that are longer").expect("write");

        let mut client = RemoteFileClient::from_session(LocalSession::new(&remote));
        let copied = client.download_file("/save.bin", &local).expect("download");
        assert_eq!(copied, 5);
        assert_eq!(fs::read(&local).expect("read"), b"fresh");
    }

    #[test]
    fn download_failure_is_a_transfer_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut client = RemoteFileClient::from_session(LocalSession::new(dir.path()));
        let err = client
            .download_file("/absent.bin", &dir.path().join("out/absent.bin"))
            .expect_err("missing remote file");
        assert!(matches!(err, FtpVaultError::Transfer { .. }));
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut client = RemoteFileClient::from_session(LocalSession::new(dir.path()));
        client.close();
        client.close();
        assert!(client.pwd().is_err());
        assert!(!client.is_directory("/"));
        assert!(client.list_entries("/").is_empty());
    }

    #[test]
    fn close_tolerates_a_failed_quit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = LocalSession::new(dir.path());
        session.fail_quit = true;
        let mut client = RemoteFileClient::from_session(session);
        client.close();
        client.close();
        assert!(client.pwd().is_err());
        drop(client);
    }
}
