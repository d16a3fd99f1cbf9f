//! Output rendering with format dispatch.
//!
//! Renderers are pure: they turn a [`DocumentationSet`] into pages with paths
//! relative to the output directory. Writing them is a separate step.

pub mod json;
pub mod markdown;

use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::{RegeldocError, Result};
use super::extract::DocumentationSet;

/// One output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Path relative to the output directory
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub project_name: String,
    /// Front matter / generation timestamp
    pub include_metadata: bool,
}

pub trait Renderer {
    fn render(&self, docs: &DocumentationSet) -> Result<Vec<RenderedPage>>;
    fn format_name(&self) -> &str;
}

/// Create a renderer for the given format name
pub fn create_renderer(format: &str, options: RenderOptions) -> Result<Box<dyn Renderer>> {
    match format {
        "markdown" | "md" => Ok(Box::new(markdown::MarkdownRenderer::new(options)?)),
        "json" => Ok(Box::new(json::JsonRenderer::new(options))),
        _ => Err(RegeldocError::Config(format!(
            "Unsupported output format: {}. Use markdown or json",
            format
        ))),
    }
}

/// Page generated for a source file: same relative path, `.md` extension
pub fn page_path(source_file: &Path) -> PathBuf {
    source_file.with_extension("md")
}

/// Link from one page to another, both relative to the output directory
pub fn relative_link(from_page: &Path, to_page: &Path) -> String {
    let from_dir: Vec<Component> = from_page.parent().map(|p| p.components().collect()).unwrap_or_default();
    let to: Vec<Component> = to_page.components().collect();

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = std::iter::repeat("..".to_string())
        .take(from_dir.len() - common)
        .collect();
    parts.extend(to[common..].iter().map(|c| c.as_os_str().to_string_lossy().into_owned()));
    parts.join("/")
}

/// Write rendered pages below `output_dir`, creating directories as needed
pub async fn write_pages(output_dir: &Path, pages: &[RenderedPage]) -> Result<()> {
    for page in pages {
        let target = output_dir.join(&page.path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &page.content).await?;
        debug!("Wrote {}", target.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_path_swaps_extension() {
        assert_eq!(page_path(Path::new("a/b/Flyt.kt")), PathBuf::from("a/b/Flyt.md"));
    }

    #[test]
    fn test_relative_links() {
        assert_eq!(relative_link(Path::new("a/b/X.md"), Path::new("a/b/Y.md")), "Y.md");
        assert_eq!(relative_link(Path::new("a/b/X.md"), Path::new("a/c/Y.md")), "../c/Y.md");
        assert_eq!(relative_link(Path::new("README.md"), Path::new("a/Y.md")), "a/Y.md");
        assert_eq!(relative_link(Path::new("a/X.md"), Path::new("Y.md")), "../Y.md");
    }

    #[test]
    fn test_unknown_format() {
        let options = RenderOptions { project_name: "p".to_string(), include_metadata: false };
        assert!(matches!(create_renderer("pdf", options), Err(RegeldocError::Config(_))));
    }

    #[tokio::test]
    async fn test_write_pages_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let pages = vec![RenderedPage { path: PathBuf::from("a/b/C.md"), content: "# C\n".to_string() }];

        write_pages(dir.path(), &pages).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a/b/C.md")).unwrap(), "# C\n");
    }
}
