// src/core/locator.rs
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{RegeldocError, Result};

/// Finds source roots and files below a repository root and maps
/// repository-relative paths to external links
#[derive(Debug)]
pub struct RepositoryLocator {
    root: PathBuf,
    source_dirs: Vec<PathBuf>,
    ignore_patterns: Vec<String>,
    file_extensions: Vec<String>,
    source_root_patterns: Vec<Regex>,
    uri_template: Option<String>,
}

impl RepositoryLocator {
    pub fn new(config: &Config, root: &Path) -> Result<Self> {
        let source_root_patterns = config
            .parsing
            .source_root_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    RegeldocError::Config(format!("Invalid source root pattern '{}': {}", pattern, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

        Ok(Self {
            root,
            source_dirs: config.project.source_dirs.clone(),
            ignore_patterns: config.project.ignore_patterns.clone(),
            file_extensions: config.parsing.file_extensions.clone(),
            source_root_patterns,
            uri_template: config.repository.uri_template.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configured source directories, else every directory matching a
    /// source root pattern, else the repository root itself
    pub fn source_roots(&self) -> Result<Vec<PathBuf>> {
        if !self.source_dirs.is_empty() {
            return Ok(self.source_dirs.iter().map(|dir| self.root.join(dir)).collect());
        }

        let mut roots = Vec::new();
        for entry in self.walker(&self.root)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }

            let relative = slash_path(entry.path().strip_prefix(&self.root).unwrap_or(entry.path()));
            if self.source_root_patterns.iter().any(|pattern| pattern.is_match(&relative)) {
                debug!("Source root: {}", relative);
                roots.push(entry.path().to_path_buf());
            }
        }

        if roots.is_empty() {
            debug!("No source roots matched, analysing {}", self.root.display());
            roots.push(self.root.clone());
        }
        Ok(roots)
    }

    /// Source files below all source roots, sorted and without duplicates
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut files = BTreeSet::new();

        for source_root in self.source_roots()? {
            if !source_root.exists() {
                return Err(RegeldocError::FileSystem(format!(
                    "Source directory does not exist: {}",
                    source_root.display()
                )));
            }

            self.collect_sources(self.walker(&source_root)?, &mut files);
        }

        info!("Discovered {} source files", files.len());
        Ok(files.into_iter().collect())
    }

    /// External link for a path relative to the repository root
    pub fn to_external_uri(&self, relative: &Path) -> String {
        match &self.uri_template {
            Some(template) => template.replace("{path}", &slash_path(relative)),
            None => format!("file://{}", slash_path(&self.root.join(relative))),
        }
    }

    /// Unreadable entries are logged and skipped
    fn collect_sources<I>(&self, entries: I, files: &mut BTreeSet<PathBuf>)
    where
        I: IntoIterator<Item = std::result::Result<ignore::DirEntry, ignore::Error>>,
    {
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && self.has_source_extension(path) {
                files.insert(path.to_path_buf());
            }
        }
    }

    fn walker(&self, dir: &Path) -> Result<ignore::Walk> {
        let mut overrides = OverrideBuilder::new(dir);
        for pattern in &self.ignore_patterns {
            overrides
                .add(&format!("!{}", pattern))
                .map_err(|e| RegeldocError::Config(format!("Invalid ignore pattern '{}': {}", pattern, e)))?;
        }
        let overrides = overrides
            .build()
            .map_err(|e| RegeldocError::Config(e.to_string()))?;

        Ok(WalkBuilder::new(dir)
            .hidden(false)
            .git_ignore(true)
            .overrides(overrides)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build())
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.file_extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }
}

/// Path with `/` separators regardless of platform
fn slash_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => out.push('/'),
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::CurDir => {}
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}
