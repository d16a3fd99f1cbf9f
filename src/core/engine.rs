// src/core/engine.rs
use std::path::{Path, PathBuf};
use anyhow::Result;
use tracing::{info, warn, debug};

use crate::config::Config;
use crate::error::RegeldocError;
use super::{
    create_renderer, write_pages, DocValidator, DocumentationAssembler, DocumentationSet,
    RenderOptions, RepositoryLocator, SourceLoader, Workspace,
};

pub const CONFIG_FILE: &str = "regeldoc.toml";

/// Main orchestration engine: discovery, parsing, extraction and output
pub struct Engine {
    config: Config,
    loader: SourceLoader,
    validator: DocValidator,
}

impl Engine {
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;

        debug!("Loaded configuration: {:?}", config);

        let loader = SourceLoader::new(&config.parsing)?;

        Ok(Self {
            config,
            loader,
            validator: DocValidator,
        })
    }

    /// Write a default configuration and create the docs directory
    pub async fn init(&self, path: Option<PathBuf>, force: bool) -> Result<()> {
        let target_dir = match path {
            Some(path) => path,
            None => std::env::current_dir()?,
        };
        info!("Initializing regeldoc in: {}", target_dir.display());

        let config_path = target_dir.join(CONFIG_FILE);
        if config_path.exists() && !force {
            return Err(RegeldocError::Config(format!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            ))
            .into());
        }

        tokio::fs::create_dir_all(&target_dir).await?;

        let mut config = Config::default();
        if let Some(name) = target_dir.canonicalize()?.file_name() {
            config.project.name = name.to_string_lossy().into_owned();
        }
        config.save(&config_path)?;
        tokio::fs::create_dir_all(target_dir.join(&config.project.docs_dir)).await?;

        info!("Wrote {}", config_path.display());
        Ok(())
    }

    /// Extract documentation from `source` and render it into `output`
    pub async fn generate(&mut self, source: Option<PathBuf>, output: Option<PathBuf>, format: Option<String>) -> Result<()> {
        let root = source.unwrap_or_else(|| self.config.project.root.clone());
        let output_dir = output.unwrap_or_else(|| self.config.project.docs_dir.clone());
        let format = format.unwrap_or_else(|| self.config.output.format.clone());

        info!("Source: {}", root.display());
        info!("Output: {} ({})", output_dir.display(), format);

        let renderer = create_renderer(&format, RenderOptions {
            project_name: self.config.project.name.clone(),
            include_metadata: self.config.output.include_metadata,
        })?;

        let docs = self.extract(&root).await?;
        if docs.is_empty() {
            warn!("No rule services, flows or sets found in {}", root.display());
        }
        for failure in &docs.failures {
            debug!("Not documented: {} ({})", failure.name, failure.error);
        }

        let pages = renderer.render(&docs)?;
        write_pages(&output_dir, &pages).await?;

        info!(
            "Wrote {} {} pages for {} declarations",
            pages.len(),
            renderer.format_name(),
            docs.len()
        );
        Ok(())
    }

    /// Run extraction and report declarations that could not be documented
    pub async fn validate(&mut self, source: Option<PathBuf>, strict: bool) -> Result<()> {
        let root = source.unwrap_or_else(|| self.config.project.root.clone());
        info!("Validating rule documentation in {}", root.display());

        let docs = self.extract(&root).await?;
        let result = self.validator.validate(&docs);

        for warning in &result.warnings {
            warn!("  - {}", warning);
        }

        if result.is_valid() {
            info!("Documentation validation passed ({} declarations)", docs.len());
        } else {
            warn!("Documentation validation failed:");
            for error in &result.errors {
                warn!("  - {}", error);
            }
            if strict {
                return Err(RegeldocError::Validation(format!(
                    "{} declarations could not be documented",
                    result.errors.len()
                ))
                .into());
            }
        }

        Ok(())
    }

    async fn extract(&mut self, root: &Path) -> Result<DocumentationSet> {
        let locator = RepositoryLocator::new(&self.config, root)?;
        let files = locator.discover()?;

        let parsed = self.loader.load_files(locator.root(), &files).await;
        let workspace = Workspace::new(parsed);
        if workspace.files().is_empty() {
            warn!("No parsable source files below {}", locator.root().display());
        }
        let config = self.config.clone();

        let docs = tokio::task::spawn_blocking(move || {
            DocumentationAssembler::new(&workspace, &config, &locator).assemble()
        })
        .await?;

        Ok(docs)
    }
}
