//! Input and output shapes of rule declarations.
//!
//! Field lists are "self then members": the first descriptor stands for the
//! request parameter or the response declaration itself, the rest for its own
//! fields.

use tree_sitter::Node;

use crate::error::ExtractError;
use super::classifier::{Role, RoleClassifier, TypeRef};
use super::harvest::harvest;
use super::model::FieldDescriptor;
use super::resolver::SymbolResolver;
use super::super::parser::ParsedFile;
use super::super::syntax::{child_of_kind, children_of_kind, declared_type};
use super::super::workspace::Declaration;

#[derive(Debug, Clone, Copy)]
pub struct ShapeExtractor<'a, 'c> {
    resolver: SymbolResolver<'a>,
    classifier: RoleClassifier<'c>,
}

impl<'a, 'c> ShapeExtractor<'a, 'c> {
    pub fn new(resolver: SymbolResolver<'a>, classifier: RoleClassifier<'c>) -> Self {
        Self { resolver, classifier }
    }

    /// Services expand their request parameter; flows and sets list every
    /// constructor parameter as written
    pub fn input_fields(&self, decl: &Declaration<'a>, role: Role) -> Result<Vec<FieldDescriptor>, ExtractError> {
        let constructor = child_of_kind(decl.node, "primary_constructor")
            .ok_or_else(|| ExtractError::not_found("primary constructor"))?;
        let parameters = children_of_kind(constructor, "class_parameter");

        if role != Role::Service {
            return Ok(parameters
                .into_iter()
                .map(|parameter| parameter_field(decl.file, parameter))
                .collect());
        }

        let (parameter, request) = parameters
            .into_iter()
            .find_map(|parameter| {
                let type_node = declared_type(parameter)?;
                let request = self.resolver.resolve_type(decl.file, type_node).ok()?;
                self.classifier.is_request_like(&request).then_some((parameter, request))
            })
            .ok_or_else(|| ExtractError::not_found("no request parameter"))?;

        let mut fields = vec![parameter_field(decl.file, parameter)];
        fields.extend(member_fields(&request));
        Ok(fields)
    }

    pub fn output_fields(&self, decl: &Declaration<'a>, response_type: &TypeRef<'a>) -> Result<Vec<FieldDescriptor>, ExtractError> {
        let response = self.resolver.resolve_type(response_type.file, response_type.node)?;

        let mut description = harvest(response.file, response.node);
        if description.is_empty() {
            description = format!("Response for {}", decl.name());
        }

        let mut fields = vec![FieldDescriptor::new(response.name(), response_type.text(), description)];
        fields.extend(member_fields(&response));
        Ok(fields)
    }
}

/// `val`/`var` constructor parameters, then body properties, in source order
pub fn member_fields(decl: &Declaration) -> Vec<FieldDescriptor> {
    let mut fields: Vec<FieldDescriptor> = child_of_kind(decl.node, "primary_constructor")
        .map(|constructor| {
            children_of_kind(constructor, "class_parameter")
                .into_iter()
                .filter(|parameter| child_of_kind(*parameter, "binding_pattern_kind").is_some())
                .map(|parameter| parameter_field(decl.file, parameter))
                .collect()
        })
        .unwrap_or_default();

    if let Some(body) = child_of_kind(decl.node, "class_body") {
        for property in children_of_kind(body, "property_declaration") {
            let Some(variable) = child_of_kind(property, "variable_declaration") else {
                continue;
            };
            let Some(name) = child_of_kind(variable, "simple_identifier") else {
                continue;
            };
            fields.push(FieldDescriptor::new(
                decl.text(name),
                declared_type(variable).map(|t| decl.text(t)).unwrap_or_default(),
                harvest(decl.file, property),
            ));
        }
    }

    fields
}

fn parameter_field(file: &ParsedFile, parameter: Node) -> FieldDescriptor {
    let name = child_of_kind(parameter, "simple_identifier")
        .map(|name| file.text(name))
        .unwrap_or_default();
    let declared = declared_type(parameter)
        .map(|t| file.text(t))
        .unwrap_or_default();

    FieldDescriptor::new(name, declared, harvest(file, parameter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkerConfig;
    use crate::core::workspace::{tests::workspace, Workspace};
    use pretty_assertions::assert_eq;

    const REQUEST: &str = r#"package regler.api

/** Forespørsel om trygdetid */
class TrygdetidRequest(
    /** Fødselsdato */
    val fodselsdato: Date,
    val land: String?
) : ServiceRequest()
"#;

    const RESPONSE: &str = r#"package regler.api

class TrygdetidResponse(
    val faktisk: Int,
    val framtidig: Int
) {
    /** Samlet */
    var samlet: Int = 0
}
"#;

    const SERVICE: &str = r#"package regler.service

import regler.api.TrygdetidRequest
import regler.api.TrygdetidResponse

class FastsettTrygdetidService(
    /** Spesifikt for tjenesten */
    private val config: Config,
    /** Selve forespørselen */
    private val request: TrygdetidRequest
) : AbstractRuleService<TrygdetidResponse>() {
    override val ruleService: () -> TrygdetidResponse = { TrygdetidResponse(1, 2) }
}
"#;

    fn service<'a>(ws: &'a Workspace, name: &str) -> Declaration<'a> {
        ws.declarations().into_iter().find(|d| d.name() == name).unwrap()
    }

    #[test]
    fn test_service_shape_round_trip() {
        let ws = workspace(&[
            ("api/TrygdetidRequest.kt", REQUEST),
            ("api/TrygdetidResponse.kt", RESPONSE),
            ("service/FastsettTrygdetidService.kt", SERVICE),
        ]);
        let markers = MarkerConfig::default();
        let classifier = RoleClassifier::new(&markers);
        let shapes = ShapeExtractor::new(SymbolResolver::new(&ws), classifier);
        let decl = service(&ws, "FastsettTrygdetidService");

        let input = shapes.input_fields(&decl, Role::Service).unwrap();
        assert_eq!(
            input,
            vec![
                FieldDescriptor::new("request", "TrygdetidRequest", "Selve forespørselen"),
                FieldDescriptor::new("fodselsdato", "Date", "Fødselsdato"),
                FieldDescriptor::new("land", "String?", ""),
            ]
        );

        let response = classifier.service_response_type(&decl).unwrap();
        let output = shapes.output_fields(&decl, &response).unwrap();
        assert_eq!(output.len(), 4);
        assert_eq!(
            output[0],
            FieldDescriptor::new(
                "TrygdetidResponse",
                "TrygdetidResponse",
                "Response for FastsettTrygdetidService"
            )
        );
        assert_eq!(output[3], FieldDescriptor::new("samlet", "Int", "Samlet"));
    }

    #[test]
    fn test_missing_request_parameter_is_fatal() {
        let ws = workspace(&[(
            "S.kt",
            "class S(val x: Int) : AbstractRuleService<R>()\nclass R\n",
        )]);
        let markers = MarkerConfig::default();
        let shapes = ShapeExtractor::new(SymbolResolver::new(&ws), RoleClassifier::new(&markers));

        let error = shapes.input_fields(&service(&ws, "S"), Role::Service).unwrap_err();
        assert_eq!(error, ExtractError::NotFound("no request parameter".to_string()));
    }

    #[test]
    fn test_flow_inputs_are_verbatim_parameters() {
        let ws = workspace(&[(
            "F.kt",
            "class F(\n    /** Grunnlag */\n    private val grunnlag: Grunnlag,\n    dato: Date\n) : AbstractRuleflow<Unit>()\n",
        )]);
        let markers = MarkerConfig::default();
        let shapes = ShapeExtractor::new(SymbolResolver::new(&ws), RoleClassifier::new(&markers));

        let input = shapes.input_fields(&service(&ws, "F"), Role::Flow).unwrap();
        assert_eq!(
            input,
            vec![
                FieldDescriptor::new("grunnlag", "Grunnlag", "Grunnlag"),
                FieldDescriptor::new("dato", "Date", ""),
            ]
        );
    }

    #[test]
    fn test_missing_primary_constructor() {
        let ws = workspace(&[("F.kt", "object F : AbstractRuleset<Unit>()\n")]);
        let markers = MarkerConfig::default();
        let shapes = ShapeExtractor::new(SymbolResolver::new(&ws), RoleClassifier::new(&markers));

        let error = shapes.input_fields(&service(&ws, "F"), Role::Set).unwrap_err();
        assert_eq!(error, ExtractError::NotFound("primary constructor".to_string()));
    }

    #[test]
    fn test_unresolved_response_is_not_found() {
        let ws = workspace(&[
            ("api/TrygdetidRequest.kt", REQUEST),
            ("S.kt", "import regler.api.TrygdetidRequest\nclass S(val r: TrygdetidRequest) : AbstractRuleService<Extern>()\n"),
        ]);
        let markers = MarkerConfig::default();
        let classifier = RoleClassifier::new(&markers);
        let shapes = ShapeExtractor::new(SymbolResolver::new(&ws), classifier);
        let decl = service(&ws, "S");

        let response = classifier.service_response_type(&decl).unwrap();
        assert!(matches!(shapes.output_fields(&decl, &response), Err(ExtractError::NotFound(_))));
        assert_eq!(shapes.input_fields(&decl, Role::Service).unwrap().len(), 3);
    }
}
