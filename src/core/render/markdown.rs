//! Markdown renderer.
//!
//! One page per source file holding every documented declaration of that file,
//! plus a `README.md` index. Page layout lives in tera templates; flow trees are
//! rendered to nested lists before they reach the template.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

use crate::error::Result;
use super::{page_path, relative_link, RenderOptions, RenderedPage, Renderer};
use super::super::extract::{
    AggregateDoc, Branch, DocumentationSet, FieldDescriptor, Flow, FlowElement,
};

const PAGE_TEMPLATE: &str = r#"{% if generated %}---
title: "{{ title }}"
generated: {{ generated }}
---

{% endif %}# {{ title }}
{% for doc in docs %}
## {{ doc.name }}

_{{ doc.kind }}_ · [Source]({{ doc.source_uri }})
{% if doc.description %}
{{ doc.description }}
{% endif %}{% if doc.input_fields %}
### Input

| Name | Type | Description |
|------|------|-------------|
{% for field in doc.input_fields %}| {{ field.name }} | {{ field.declared_type }} | {{ field.description }} |
{% endfor %}{% endif %}{% if doc.output_fields %}
### Output

| Name | Type | Description |
|------|------|-------------|
{% for field in doc.output_fields %}| {{ field.name }} | {{ field.declared_type }} | {{ field.description }} |
{% endfor %}{% endif %}
### Flow

{% if doc.flow %}{{ doc.flow }}{% else %}_No steps._
{% endif %}{% endfor %}"#;

const INDEX_TEMPLATE: &str = r#"{% if generated %}---
title: "{{ project }}"
generated: {{ generated }}
---

{% endif %}# {{ project }}
{% for section in sections %}{% if section.entries %}
## {{ section.title }}

{% for entry in section.entries %}- [{{ entry.name }}]({{ entry.link }}){% if entry.summary %}: {{ entry.summary }}{% endif %}
{% endfor %}{% endif %}{% endfor %}{% if failures %}
## Not documented

| Declaration | File | Reason |
|-------------|------|--------|
{% for failure in failures %}| {{ failure.name }} | {{ failure.source_file }} | {{ failure.reason }} |
{% endfor %}{% endif %}"#;

pub struct MarkdownRenderer {
    tera: Tera,
    options: RenderOptions,
}

#[derive(Serialize)]
struct PageView {
    title: String,
    generated: Option<String>,
    docs: Vec<DocView>,
}

#[derive(Serialize)]
struct DocView {
    name: String,
    kind: &'static str,
    description: String,
    source_uri: String,
    input_fields: Vec<FieldView>,
    output_fields: Vec<FieldView>,
    flow: String,
}

#[derive(Serialize)]
struct FieldView {
    name: String,
    declared_type: String,
    description: String,
}

#[derive(Serialize)]
struct IndexView {
    project: String,
    generated: Option<String>,
    sections: Vec<SectionView>,
    failures: Vec<FailureView>,
}

#[derive(Serialize)]
struct SectionView {
    title: &'static str,
    entries: Vec<EntryView>,
}

#[derive(Serialize)]
struct EntryView {
    name: String,
    link: String,
    summary: String,
}

#[derive(Serialize)]
struct FailureView {
    name: String,
    source_file: String,
    reason: String,
}

impl MarkdownRenderer {
    pub fn new(options: RenderOptions) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("page.md", PAGE_TEMPLATE)?;
        tera.add_raw_template("index.md", INDEX_TEMPLATE)?;
        Ok(Self { tera, options })
    }

    fn generated(&self) -> Option<String> {
        self.options
            .include_metadata
            .then(|| chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string())
    }

    fn render_page(&self, source_file: &Path, docs: &[(&'static str, &dyn AggregateDoc)]) -> Result<RenderedPage> {
        let page = page_path(source_file);
        let view = PageView {
            title: source_file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            generated: self.generated(),
            docs: docs
                .iter()
                .map(|&(kind, doc)| DocView {
                    name: doc.name().to_string(),
                    kind,
                    description: doc.description().to_string(),
                    source_uri: doc.source_uri().to_string(),
                    input_fields: field_views(doc.input_fields()),
                    output_fields: field_views(doc.output_fields()),
                    flow: render_flow(doc.flow(), &page),
                })
                .collect(),
        };

        let content = self.tera.render("page.md", &Context::from_serialize(&view)?)?;
        Ok(RenderedPage { path: page, content })
    }

    fn render_index(&self, docs: &DocumentationSet) -> Result<RenderedPage> {
        let index = PathBuf::from("README.md");
        let entries = |items: Vec<&dyn AggregateDoc>| -> Vec<EntryView> {
            items
                .into_iter()
                .map(|doc| EntryView {
                    name: doc.name().to_string(),
                    link: relative_link(&index, &page_path(doc.source_file())),
                    summary: doc.description().lines().next().unwrap_or_default().to_string(),
                })
                .collect()
        };

        let view = IndexView {
            project: self.options.project_name.clone(),
            generated: self.generated(),
            sections: vec![
                SectionView {
                    title: "Services",
                    entries: entries(docs.services.iter().map(|d| d as &dyn AggregateDoc).collect()),
                },
                SectionView {
                    title: "Flows",
                    entries: entries(docs.flows.iter().map(|d| d as &dyn AggregateDoc).collect()),
                },
                SectionView {
                    title: "Rule sets",
                    entries: entries(docs.sets.iter().map(|d| d as &dyn AggregateDoc).collect()),
                },
            ],
            failures: docs
                .failures
                .iter()
                .map(|failure| FailureView {
                    name: failure.name.clone(),
                    source_file: failure.source_file.display().to_string(),
                    reason: table_cell(&failure.error.to_string()),
                })
                .collect(),
        };

        let content = self.tera.render("index.md", &Context::from_serialize(&view)?)?;
        Ok(RenderedPage { path: index, content })
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, docs: &DocumentationSet) -> Result<Vec<RenderedPage>> {
        let mut by_file: BTreeMap<&Path, Vec<(&'static str, &dyn AggregateDoc)>> = BTreeMap::new();
        for doc in &docs.services {
            by_file.entry(doc.source_file.as_path()).or_default().push(("Rule service", doc));
        }
        for doc in &docs.flows {
            by_file.entry(doc.source_file.as_path()).or_default().push(("Rule flow", doc));
        }
        for doc in &docs.sets {
            by_file.entry(doc.source_file.as_path()).or_default().push(("Rule set", doc));
        }

        let mut pages = vec![self.render_index(docs)?];
        for (source_file, file_docs) in by_file {
            pages.push(self.render_page(source_file, &file_docs)?);
        }
        Ok(pages)
    }

    fn format_name(&self) -> &str {
        "markdown"
    }
}

fn field_views(fields: &[FieldDescriptor]) -> Vec<FieldView> {
    fields
        .iter()
        .map(|field| FieldView {
            name: table_cell(&field.name),
            declared_type: if field.declared_type.is_empty() {
                String::new()
            } else {
                code(&field.declared_type)
            },
            description: table_cell(&field.description),
        })
        .collect()
}

/// Render a flow as a nested markdown list, links relative to `page`
pub fn render_flow(flow: &Flow, page: &Path) -> String {
    let mut out = String::new();
    write_elements(&flow.elements, page, 0, &mut out);
    out
}

fn write_elements(elements: &[FlowElement], page: &Path, depth: usize, out: &mut String) {
    for element in elements {
        write_element(element, page, depth, out);
    }
}

fn write_element(element: &FlowElement, page: &Path, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match element {
        FlowElement::Flow(flow) => {
            out.push_str(&format!("{}- Sequence\n", indent));
            write_elements(&flow.elements, page, depth + 1, out);
        }
        FlowElement::Invocation { name, source_file } => {
            out.push_str(&format!("{}- {} ({})\n", indent, code(name), source_file.display()));
        }
        FlowElement::FlowReference { name, source_file } => {
            let link = relative_link(page, &page_path(source_file));
            out.push_str(&format!("{}- Flow [{}]({})\n", indent, name, link));
        }
        FlowElement::SetReference { name, source_file } => {
            let link = relative_link(page, &page_path(source_file));
            out.push_str(&format!("{}- Rule set [{}]({})\n", indent, name, link));
        }
        FlowElement::BranchPoint(point) => {
            out.push_str(&format!("{}- **{}**", indent, point.name()));
            if !point.description().is_empty() {
                out.push_str(&format!(": {}", single_line(point.description())));
            }
            out.push('\n');
            for branch in point.branches() {
                write_branch(branch, page, depth + 1, out);
            }
        }
        FlowElement::Branch(branch) => write_branch(branch, page, depth, out),
    }
}

fn write_branch(branch: &Branch, page: &Path, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let label = if branch.condition.label.is_empty() {
        "When".to_string()
    } else {
        format!("When _{}_", branch.condition.label)
    };
    out.push_str(&format!("{}- {}: {}", indent, label, code(&branch.condition.expression)));
    if !branch.description.is_empty() {
        out.push_str(&format!(" ({})", single_line(&branch.description)));
    }
    out.push('\n');

    if branch.body.is_empty() {
        out.push_str(&format!("{}  - _No steps._\n", indent));
    } else {
        write_elements(&branch.body.elements, page, depth + 1, out);
    }
}

/// Inline code span that survives backticks and line breaks in the content
fn code(text: &str) -> String {
    let text = single_line(text);
    if text.contains('`') {
        format!("`` {} ``", text)
    } else {
        format!("`{}`", text)
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn table_cell(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("<br>")
        .replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::{
        BranchPoint, ConditionDescriptor, ExtractionFailure, FlowDoc, ServiceDoc,
    };
    use crate::error::ExtractError;

    fn options() -> RenderOptions {
        RenderOptions { project_name: "Pensjonsregler".to_string(), include_metadata: false }
    }

    fn sample() -> DocumentationSet {
        let branch_point = BranchPoint::new(
            "Input ok?".to_string(),
            "Sjekker input".to_string(),
            vec![
                Branch {
                    description: String::new(),
                    condition: ConditionDescriptor { label: "Tom".to_string(), expression: "x.isEmpty()".to_string() },
                    body: Flow::new(vec![FlowElement::SetReference {
                        name: "SjekkSett".to_string(),
                        source_file: PathBuf::from("regler/sett/SjekkSett.kt"),
                    }]),
                },
                Branch {
                    description: String::new(),
                    condition: ConditionDescriptor { label: String::new(), expression: "x.isNotEmpty()".to_string() },
                    body: Flow::default(),
                },
            ],
        )
        .unwrap();

        DocumentationSet {
            services: vec![ServiceDoc {
                name: "TrygdetidService".to_string(),
                description: "Fastsetter trygdetid.\nBrukes av pensjon.".to_string(),
                input_fields: vec![FieldDescriptor::new("request", "TrygdetidRequest", "Forespørsel")],
                output_fields: vec![FieldDescriptor::new("TrygdetidResponse", "TrygdetidResponse", "Response for TrygdetidService")],
                flow: Flow::new(vec![FlowElement::FlowReference {
                    name: "TrygdetidFlyt".to_string(),
                    source_file: PathBuf::from("regler/flyt/TrygdetidFlyt.kt"),
                }]),
                source_file: PathBuf::from("regler/service/TrygdetidService.kt"),
                source_uri: "https://example.org/regler/service/TrygdetidService.kt".to_string(),
            }],
            flows: vec![FlowDoc {
                name: "TrygdetidFlyt".to_string(),
                description: String::new(),
                input_fields: vec![FieldDescriptor::new("x", "List<Int>", "")],
                flow: Flow::new(vec![
                    FlowElement::Invocation { name: "logg".to_string(), source_file: PathBuf::from("util/Logg.kt") },
                    FlowElement::BranchPoint(branch_point),
                ]),
                source_file: PathBuf::from("regler/flyt/TrygdetidFlyt.kt"),
                source_uri: "https://example.org/regler/flyt/TrygdetidFlyt.kt".to_string(),
            }],
            sets: vec![],
            failures: vec![ExtractionFailure {
                name: "Ødelagt".to_string(),
                source_file: PathBuf::from("regler/Odelagt.kt"),
                error: ExtractError::MissingCondition,
            }],
        }
    }

    #[test]
    fn test_flow_tree_rendering() {
        let docs = sample();
        let page = page_path(&docs.flows[0].source_file);

        let rendered = render_flow(&docs.flows[0].flow, &page);
        assert_eq!(
            rendered,
            "- `logg` (util/Logg.kt)\n\
             - **Input ok?**: Sjekker input\n\
             \x20 - When _Tom_: `x.isEmpty()`\n\
             \x20   - Rule set [SjekkSett](../sett/SjekkSett.md)\n\
             \x20 - When: `x.isNotEmpty()`\n\
             \x20   - _No steps._\n"
        );
    }

    #[test]
    fn test_one_page_per_source_file_plus_index() {
        let renderer = MarkdownRenderer::new(options()).unwrap();
        let pages = renderer.render(&sample()).unwrap();

        let paths: Vec<_> = pages.iter().map(|page| page.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("README.md"),
                PathBuf::from("regler/flyt/TrygdetidFlyt.md"),
                PathBuf::from("regler/service/TrygdetidService.md"),
            ]
        );

        let service = &pages[2].content;
        assert!(service.starts_with("# TrygdetidService\n"));
        assert!(service.contains("_Rule service_ · [Source](https://example.org/regler/service/TrygdetidService.kt)"));
        assert!(service.contains("| request | `TrygdetidRequest` | Forespørsel |"));
        assert!(service.contains("### Output"));
        assert!(service.contains("- Flow [TrygdetidFlyt](../flyt/TrygdetidFlyt.md)"));

        let flow = &pages[1].content;
        assert!(!flow.contains("### Output"));
        assert!(flow.contains("| x | `List<Int>` |  |"));
    }

    #[test]
    fn test_index_lists_collections_and_failures() {
        let renderer = MarkdownRenderer::new(options()).unwrap();
        let pages = renderer.render(&sample()).unwrap();
        let index = &pages[0].content;

        assert!(index.starts_with("# Pensjonsregler\n"));
        assert!(index.contains("- [TrygdetidService](regler/service/TrygdetidService.md): Fastsetter trygdetid."));
        assert!(index.contains("- [TrygdetidFlyt](regler/flyt/TrygdetidFlyt.md)\n"));
        assert!(!index.contains("## Rule sets"));
        assert!(index.contains("| Ødelagt | regler/Odelagt.kt | Branch is missing its condition |"));
    }

    #[test]
    fn test_front_matter_with_metadata() {
        let renderer = MarkdownRenderer::new(RenderOptions { include_metadata: true, ..options() }).unwrap();
        let pages = renderer.render(&DocumentationSet::default()).unwrap();

        assert_eq!(pages.len(), 1);
        assert!(pages[0].content.starts_with("---\ntitle: \"Pensjonsregler\"\ngenerated: "));
    }

    #[test]
    fn test_code_spans() {
        assert_eq!(code("a\n  .b()"), "`a .b()`");
        assert_eq!(code("`when`"), "`` `when` ``");
        assert_eq!(table_cell("a|b\nc"), "a\\|b<br>c");
    }
}
