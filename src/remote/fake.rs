//! Directory-backed stand-in for an FTP server, used by unit tests.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::model::Profile;
use crate::error::{FtpVaultError, Result};
use crate::remote::session::{FtpSession, SessionError, SessionResult};
use crate::remote::{Connector, RemoteFileClient};
use crate::util::paths::normalize_remote;

#[derive(Debug, Clone, Default)]
pub struct LocalSession {
    root: PathBuf,
    cwd: String,
    pub fail_mlsd: bool,
    pub fail_nlst: bool,
    pub fail_quit: bool,
    pub nlst_override: Option<Vec<String>>,
    /// Remote paths whose RETR fails.
    pub fail_retr: Vec<String>,
    /// Extra raw MLSD lines appended for a remote directory.
    pub extra_mlsd: HashMap<String, Vec<String>>,
}

impl LocalSession {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            cwd: "/".to_string(),
            ..Self::default()
        }
    }

    fn absolute(&self, path: &str) -> String {
        if path.starts_with('/') {
            normalize_remote(path)
        } else {
            normalize_remote(&format!("{}/{}", self.cwd, path))
        }
    }

    fn local(&self, path: &str) -> PathBuf {
        self.root.join(self.absolute(path).trim_start_matches('/'))
    }

    fn sorted_names(&self, path: &str) -> SessionResult<Vec<(String, bool, u64)>> {
        let dir = self.local(path);
        let mut out = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            out.push((
                entry.file_name().to_string_lossy().to_string(),
                meta.is_dir(),
                meta.len(),
            ));
        }
        out.sort();
        Ok(out)
    }
}

impl FtpSession for LocalSession {
    fn pwd(&mut self) -> SessionResult<String> {
        Ok(self.cwd.clone())
    }

    fn cwd(&mut self, path: &str) -> SessionResult<()> {
        if !self.local(path).is_dir() {
            return Err(SessionError(format!("550 {}: No such directory", path)));
        }
        self.cwd = self.absolute(path);
        Ok(())
    }

    fn mlsd(&mut self, path: &str) -> SessionResult<Vec<String>> {
        if self.fail_mlsd {
            return Err(SessionError("500 MLSD not understood".to_string()));
        }
        let mut lines = vec!["type=cdir; .".to_string(), "type=pdir; ..".to_string()];
        for (name, is_dir, size) in self.sorted_names(path)? {
            if is_dir {
                lines.push(format!("type=dir;perm=el; {}", name));
            } else {
                lines.push(format!("type=file;size={}; {}", size, name));
            }
        }
        if let Some(extra) = self.extra_mlsd.get(&self.absolute(path)) {
            lines.extend(extra.iter().cloned());
        }
        Ok(lines)
    }

    fn nlst(&mut self, path: &str) -> SessionResult<Vec<String>> {
        if self.fail_nlst {
            return Err(SessionError("450 NLST failed".to_string()));
        }
        if let Some(names) = &self.nlst_override {
            return Ok(names.clone());
        }
        let base = self.absolute(path);
        Ok(self
            .sorted_names(path)?
            .into_iter()
            .map(|(name, _, _)| format!("{}/{}", base.trim_end_matches('/'), name))
            .collect())
    }

    fn retr(&mut self, path: &str, out: &mut dyn Write) -> SessionResult<u64> {
        let absolute = self.absolute(path);
        if self.fail_retr.contains(&absolute) {
            return Err(SessionError(format!("426 transfer of {} aborted", absolute)));
        }
        let mut file = File::open(self.local(path))?;
        Ok(io::copy(&mut file, out)?)
    }

    fn quit(&mut self) -> SessionResult<()> {
        if self.fail_quit {
            return Err(SessionError("421 gone".to_string()));
        }
        Ok(())
    }
}

/// Hands out clones of a configured session, or a canned connect error.
#[derive(Debug, Clone)]
pub struct LocalConnector {
    pub template: LocalSession,
    pub refuse: Option<String>,
}

impl LocalConnector {
    pub fn new(root: &Path) -> Self {
        Self {
            template: LocalSession::new(root),
            refuse: None,
        }
    }
}

impl Connector for LocalConnector {
    type Session = LocalSession;

    fn connect(&self, _profile: &Profile) -> Result<RemoteFileClient<LocalSession>> {
        if let Some(message) = &self.refuse {
            return Err(FtpVaultError::Connection(message.clone()));
        }
        Ok(RemoteFileClient::from_session(self.template.clone()))
    }
}
