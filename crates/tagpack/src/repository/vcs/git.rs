//! Git driver - uses git command-line tools for repository access.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tempfile::TempDir;

use super::driver::{parse_composer_json, VcsDriver, VcsDriverError};
use crate::config::VcsConfig;
use crate::package::{Dist, Source};
use crate::util::{redact_url, sanitize_url};

/// Git driver for local and remote git repositories.
///
/// Local paths are read in place. Anything else is mirrored with
/// `git clone --mirror`, into `cache-vcs-dir` when configured so later scans
/// only fetch what changed.
pub struct GitDriver {
    url: String,
    /// Repository the git commands run in, set by `initialize`
    repo_path: Option<PathBuf>,
    cache_vcs_dir: Option<PathBuf>,
    /// Holds a throwaway mirror when no cache directory is configured
    temp_dir: Option<TempDir>,
    timeout: Option<Duration>,
    root_identifier: Option<String>,
}

impl GitDriver {
    pub fn new(url: impl Into<String>, config: &VcsConfig) -> Self {
        Self {
            url: url.into(),
            repo_path: None,
            cache_vcs_dir: config.cache_vcs_dir.clone(),
            temp_dir: None,
            timeout: process_timeout(config),
            root_identifier: None,
        }
    }

    /// Create an already initialized driver reading a local repository
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, VcsDriverError> {
        let path = path.into();
        let mut driver = Self::new(path.to_string_lossy(), &VcsConfig::default());
        driver.initialize()?;
        Ok(driver)
    }

    /// Check if the driver can read the given URL.
    ///
    /// The shallow check looks at the URL shape and the local filesystem;
    /// the deep check asks the remote with `git ls-remote`.
    pub fn supports(url: &str, deep: bool, config: &VcsConfig) -> bool {
        if GIT_URL_RE.is_match(url) {
            return true;
        }

        if let Some(path) = local_path(url) {
            return is_repository_dir(&path);
        }

        if deep {
            let mut ls_remote = git_command();
            ls_remote.args(["ls-remote", "--heads", "--", url]);
            return run_with_timeout(&mut ls_remote, process_timeout(config))
                .is_ok_and(|output| output.status.success());
        }

        false
    }

    pub fn is_local(&self) -> bool {
        local_path(&self.url).is_some()
    }

    /// Directory holding the repository once initialized
    pub fn repo_path(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }

    /// Run a git command in the repository
    fn run_git(&self, args: &[&str]) -> Result<String, VcsDriverError> {
        let path = self.repo_path.as_ref().ok_or_else(|| {
            VcsDriverError::GitError(format!("{} driver is not initialized", redact_url(&self.url)))
        })?;

        let mut cmd = git_command();
        cmd.args(args).current_dir(path);
        let output = run_with_timeout(&mut cmd, self.timeout)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(VcsDriverError::GitError(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }

    fn mirror_dir(&mut self) -> Result<PathBuf, VcsDriverError> {
        let name = sanitize_url(&self.url);

        let root = match &self.cache_vcs_dir {
            Some(dir) => dir.clone(),
            None => {
                let temp = TempDir::new()
                    .map_err(|e| VcsDriverError::GitError(format!("Failed to create temp dir: {}", e)))?;
                let root = temp.path().to_path_buf();
                self.temp_dir = Some(temp);
                root
            }
        };

        fs::create_dir_all(&root).map_err(|e| {
            VcsDriverError::GitError(format!("Failed to create {}: {}", root.display(), e))
        })?;

        Ok(root.join(name))
    }

    /// Create or refresh the local mirror of a remote repository
    fn sync_mirror(&mut self) -> Result<PathBuf, VcsDriverError> {
        let dir = self.mirror_dir()?;
        let shown = redact_url(&self.url);

        if dir.join("HEAD").is_file() {
            log::debug!("Updating mirror of {} in {}", shown, dir.display());

            let mut set_url = git_command();
            set_url
                .current_dir(&dir)
                .args(["remote", "set-url", "origin", self.url.as_str()]);
            self.run_network(set_url)?;

            let mut update = git_command();
            update.current_dir(&dir).args(["remote", "update", "--prune", "origin"]);
            if self.run_network(update).is_ok() {
                return Ok(dir);
            }

            log::info!("Mirror of {} is unusable, cloning it again", shown);
            fs::remove_dir_all(&dir).map_err(|e| {
                VcsDriverError::GitError(format!("Failed to remove {}: {}", dir.display(), e))
            })?;
        }

        log::debug!("Cloning {} into {}", shown, dir.display());

        let mut clone = git_command();
        clone
            .args(["clone", "--mirror", "--quiet", "--"])
            .arg(&self.url)
            .arg(&dir);
        self.run_network(clone)?;

        Ok(dir)
    }

    /// Run a command that talks to the remote, bounded by the process timeout
    fn run_network(&self, mut cmd: Command) -> Result<(), VcsDriverError> {
        let output = run_with_timeout(&mut cmd, self.timeout)?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify_remote_error(&redact_url(&self.url), &stderr))
    }

    fn list_refs(&self, namespace: &str, peel: bool) -> Result<IndexMap<String, String>, VcsDriverError> {
        let format = if peel {
            "--format=%(refname:strip=2)%09%(objectname)%09%(*objectname)"
        } else {
            "--format=%(refname:strip=2)%09%(objectname)"
        };
        let output = self.run_git(&["for-each-ref", format, namespace])?;

        let mut refs = IndexMap::new();
        for line in output.lines() {
            let mut parts = line.split('\t');
            let (Some(name), Some(sha)) = (parts.next(), parts.next()) else {
                continue;
            };
            // annotated tags resolve to the commit they point at
            let sha = match parts.next() {
                Some(peeled) if !peeled.is_empty() => peeled,
                _ => sha,
            };
            refs.insert(name.to_string(), sha.to_string());
        }

        Ok(refs)
    }

    fn commit_time(&self, identifier: &str) -> Option<String> {
        self.run_git(&["show", "-s", "--format=%cI", identifier, "--"])
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl VcsDriver for GitDriver {
    fn initialize(&mut self) -> Result<(), VcsDriverError> {
        if self.repo_path.is_some() {
            return Ok(());
        }

        let path = match local_path(&self.url) {
            Some(path) if is_repository_dir(&path) => path,
            Some(path) => {
                return Err(VcsDriverError::NotFound(format!(
                    "{} is not a git repository",
                    path.display()
                )))
            }
            None => self.sync_mirror()?,
        };
        self.repo_path = Some(path);

        // the default branch, or the commit of a detached HEAD
        let root = match self.run_git(&["symbolic-ref", "--quiet", "--short", "HEAD"]) {
            Ok(branch) => branch.trim().to_string(),
            Err(_) => self.run_git(&["rev-parse", "HEAD"])?.trim().to_string(),
        };
        self.root_identifier = Some(root);

        Ok(())
    }

    fn get_root_identifier(&self) -> Result<String, VcsDriverError> {
        self.root_identifier
            .clone()
            .ok_or_else(|| VcsDriverError::GitError(format!("{} driver is not initialized", redact_url(&self.url))))
    }

    fn get_tags(&self) -> Result<IndexMap<String, String>, VcsDriverError> {
        self.list_refs("refs/tags/", true)
    }

    fn get_branches(&self) -> Result<IndexMap<String, String>, VcsDriverError> {
        self.list_refs("refs/heads/", false)
    }

    fn get_file_content(&self, file: &str, identifier: &str) -> Result<Option<String>, VcsDriverError> {
        match self.run_git(&["show", &format!("{}:{}", identifier, file)]) {
            Ok(content) => Ok(Some(content)),
            Err(VcsDriverError::GitError(msg))
                if msg.contains("does not exist in") || msg.contains("exists on disk, but not in") =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn get_composer_information(
        &self,
        identifier: &str,
    ) -> Result<Option<Map<String, Value>>, VcsDriverError> {
        let Some(content) = self.get_file_content("composer.json", identifier)? else {
            return Ok(None);
        };
        let mut composer = parse_composer_json(&content, identifier)?;

        if !composer.contains_key("time") {
            if let Some(time) = self.commit_time(identifier) {
                composer.insert("time".to_string(), Value::String(time));
            }
        }

        Ok(Some(composer))
    }

    fn get_dist(&self, _identifier: &str) -> Option<Dist> {
        None
    }

    fn get_source(&self, identifier: &str) -> Source {
        Source::git(self.url.clone(), identifier)
    }

    fn get_url(&self) -> &str {
        &self.url
    }

    fn cleanup(&mut self) {
        if let Some(temp) = self.temp_dir.take() {
            self.repo_path = None;
            self.root_identifier = None;
            if let Err(e) = temp.close() {
                log::debug!("Failed to remove temporary mirror: {}", e);
            }
        }
    }
}

lazy_static! {
    static ref GIT_URL_RE: Regex =
        Regex::new(r"(?i)(^git://|\.git/?$|git(?:olite)?@|//git\.|//github\.com/)").unwrap();
}

/// A git invocation that never prompts for credentials and reports in English,
/// since missing files and remotes are recognized by their messages
fn git_command() -> Command {
    let mut cmd = Command::new("git");
    cmd.env("GIT_TERMINAL_PROMPT", "0")
        .env("GIT_ASKPASS", "echo")
        .env("LC_ALL", "C");
    cmd
}

fn process_timeout(config: &VcsConfig) -> Option<Duration> {
    (config.process_timeout > 0).then(|| Duration::from_secs(config.process_timeout))
}

/// Filesystem path for URLs that name a local directory. `file://` URLs
/// are cloned like any remote.
fn local_path(url: &str) -> Option<PathBuf> {
    if url.contains("://") || url.contains('@') {
        return None;
    }
    let path = Path::new(url);
    path.is_dir().then(|| path.to_path_buf())
}

fn is_repository_dir(path: &Path) -> bool {
    path.join(".git").exists() || path.join("HEAD").is_file()
}

fn classify_remote_error(url: &str, stderr: &str) -> VcsDriverError {
    let lower = stderr.to_lowercase();

    if lower.contains("not found") || lower.contains("does not exist") || lower.contains("does not appear to be a git repository") {
        VcsDriverError::NotFound(format!("{}: {}", url, stderr))
    } else if lower.contains("authentication") || lower.contains("permission denied") || lower.contains("could not read username") {
        VcsDriverError::AuthRequired(format!("{}: {}", url, stderr))
    } else {
        VcsDriverError::GitError(format!("{}: {}", url, stderr))
    }
}

/// Run a command to completion, killing it once `timeout` has passed
fn run_with_timeout(cmd: &mut Command, timeout: Option<Duration>) -> Result<Output, VcsDriverError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| VcsDriverError::GitError(format!("Failed to execute git: {}", e)))?;

    let Some(timeout) = timeout else {
        return child
            .wait_with_output()
            .map_err(|e| VcsDriverError::GitError(e.to_string()));
    };

    // both pipes are read while waiting so a full buffer cannot stall git
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(VcsDriverError::GitError(format!(
                    "git did not finish within {} seconds",
                    timeout.as_secs()
                )));
            }
            Ok(None) => thread::sleep(Duration::from_millis(20)),
            Err(e) => return Err(VcsDriverError::GitError(e.to_string())),
        }
    };

    Ok(Output {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain(mut pipe: impl Read + Send + 'static) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        buffer
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
