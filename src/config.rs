use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RegeldocError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Source code parsing configuration
    pub parsing: ParsingConfig,

    /// Supertype markers and entry-point member names
    pub markers: MarkerConfig,

    /// Names of the flow DSL functions
    pub vocabulary: VocabularyConfig,

    /// External link settings
    pub repository: RepositoryConfig,

    /// Extraction worker settings
    pub extraction: ExtractionConfig,

    /// Output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Repository root; source and doc paths are relative to it
    pub root: PathBuf,

    /// Directories to analyze. Empty means discover source roots below `root`
    pub source_dirs: Vec<PathBuf>,

    /// Glob patterns to ignore (gitignore syntax)
    pub ignore_patterns: Vec<String>,

    /// Documentation output directory
    pub docs_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// File extensions to parse
    pub file_extensions: Vec<String>,

    /// Maximum file size to parse (in bytes)
    pub max_file_size: usize,

    /// Regular expressions matched against directory paths (with `/` separators)
    /// to recognise source roots during discovery
    pub source_root_patterns: Vec<String>,
}

/// Textual markers used to classify declarations by their supertypes.
///
/// A supertype matches a role when its source text contains any of the
/// role's markers. Order inside each list matters only for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub service: Vec<String>,
    pub flow: Vec<String>,
    pub set: Vec<String>,
    pub request: Vec<String>,

    /// Overridden member holding a service's steps
    pub service_entry: String,
    /// Overridden member holding a flow's steps
    pub flow_entry: String,
    /// Overridden member holding a rule set's steps
    pub set_entry: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    pub branch_point: String,
    pub branch: String,
    pub condition: String,
    pub sub_flow: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Link template with a `{path}` placeholder, e.g.
    /// `https://github.com/org/repo/blob/main/{path}`. Falls back to `file://` links.
    pub uri_template: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Declarations handed to the worker pool per batch
    pub batch_size: usize,

    /// Worker threads; 0 uses one per CPU
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (markdown, json)
    pub format: String,

    /// Include metadata headers
    pub include_metadata: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            parsing: ParsingConfig::default(),
            markers: MarkerConfig::default(),
            vocabulary: VocabularyConfig::default(),
            repository: RepositoryConfig::default(),
            extraction: ExtractionConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Unnamed Project".to_string(),
            root: PathBuf::from("."),
            source_dirs: vec![],
            ignore_patterns: vec![
                "target/".to_string(),
                "build/".to_string(),
                ".git/".to_string(),
                ".gradle/".to_string(),
            ],
            docs_dir: PathBuf::from("docs"),
        }
    }
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            file_extensions: vec!["kt".to_string()],
            max_file_size: 1024 * 1024, // 1MB
            source_root_patterns: vec![r"(^|/)src/main/kotlin$".to_string()],
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            service: vec!["RuleService".to_string()],
            flow: vec!["Ruleflow".to_string()],
            set: vec!["Ruleset".to_string()],
            request: vec!["ServiceRequest".to_string()],
            service_entry: "ruleService".to_string(),
            flow_entry: "ruleflow".to_string(),
            set_entry: "create".to_string(),
        }
    }
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            branch_point: "forgrening".to_string(),
            branch: "gren".to_string(),
            condition: "betingelse".to_string(),
            sub_flow: "flyt".to_string(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            workers: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "markdown".to_string(),
            include_metadata: true,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| RegeldocError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RegeldocError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                // Try common config file locations
                let candidates = [
                    "Regeldoc.toml",
                    "regeldoc.toml",
                    ".regeldoc.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let markers = &self.markers;
        for (role, list) in [
            ("service", &markers.service),
            ("flow", &markers.flow),
            ("set", &markers.set),
            ("request", &markers.request),
        ] {
            if list.iter().any(|m| m.trim().is_empty()) {
                return Err(RegeldocError::Config(format!("empty {} marker", role)));
            }
        }
        if self.extraction.batch_size == 0 {
            return Err(RegeldocError::Config("extraction.batch_size must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[project]
name = "pensjon-regler"

[markers]
service = ["AbstractPensjonRuleService"]
"#,
        )
        .unwrap();

        assert_eq!(config.project.name, "pensjon-regler");
        assert_eq!(config.markers.service, vec!["AbstractPensjonRuleService"]);
        assert_eq!(config.markers.flow, vec!["Ruleflow"]);
        assert_eq!(config.vocabulary.branch_point, "forgrening");
        assert_eq!(config.extraction.batch_size, 256);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regeldoc.toml");

        let mut config = Config::default();
        config.repository.uri_template = Some("https://example.org/{path}".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.repository.uri_template.as_deref(), Some("https://example.org/{path}"));
        assert_eq!(loaded.markers.set_entry, "create");
    }

    #[test]
    fn test_rejects_empty_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regeldoc.toml");
        std::fs::write(&path, "[markers]\nflow = [\"\"]\n").unwrap();

        assert!(matches!(Config::load(&path), Err(RegeldocError::Config(_))));
    }
}
