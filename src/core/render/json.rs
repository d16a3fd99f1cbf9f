//! JSON renderer: the whole documentation set as one document for tooling.

use serde::Serialize;
use std::path::PathBuf;

use crate::error::Result;
use super::{RenderOptions, RenderedPage, Renderer};
use super::super::extract::DocumentationSet;

pub const OUTPUT_FILE: &str = "regeldoc.json";

pub struct JsonRenderer {
    options: RenderOptions,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    project: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    generated: Option<String>,
    #[serde(flatten)]
    documentation: &'a DocumentationSet,
}

impl JsonRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, docs: &DocumentationSet) -> Result<Vec<RenderedPage>> {
        let document = JsonDocument {
            project: &self.options.project_name,
            generated: self.options.include_metadata.then(|| chrono::Utc::now().to_rfc3339()),
            documentation: docs,
        };

        let mut content = serde_json::to_string_pretty(&document)?;
        content.push('\n');
        Ok(vec![RenderedPage { path: PathBuf::from(OUTPUT_FILE), content }])
    }

    fn format_name(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::{Flow, FlowElement, SetDoc};

    #[test]
    fn test_renders_single_document() {
        let docs = DocumentationSet {
            sets: vec![SetDoc {
                name: "AlderSett".to_string(),
                description: "Alder".to_string(),
                input_fields: vec![],
                flow: Flow::new(vec![FlowElement::Invocation {
                    name: "regel".to_string(),
                    source_file: PathBuf::from("dsl/Regel.kt"),
                }]),
                source_file: PathBuf::from("sett/AlderSett.kt"),
                source_uri: "file:///repo/sett/AlderSett.kt".to_string(),
            }],
            ..DocumentationSet::default()
        };
        let renderer = JsonRenderer::new(RenderOptions { project_name: "p".to_string(), include_metadata: false });

        let pages = renderer.render(&docs).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].path, PathBuf::from("regeldoc.json"));

        let value: serde_json::Value = serde_json::from_str(&pages[0].content).unwrap();
        assert_eq!(value["project"], "p");
        assert!(value.get("generated").is_none());
        assert_eq!(value["sets"][0]["name"], "AlderSett");
        assert_eq!(value["sets"][0]["flow"]["elements"][0]["type"], "Invocation");
        assert_eq!(value["services"].as_array().unwrap().len(), 0);
    }
}
