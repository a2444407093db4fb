use async_graphql_parser::types::{BaseType, TypeKind, TypeSystemDefinition};
use eyre::{eyre, WrapErr};
use std::path::Path;

/// GraphQL schema embedded into the API resource
#[derive(Debug, Clone)]
pub struct Schema {
    /// Raw SDL text, stored verbatim in the template
    pub definition: String,
}

impl Schema {
    /// Load the schema file and check it declares what the stack wires up
    pub fn from_path(path: &Path) -> eyre::Result<Self> {
        let definition = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read the schema file at {}", path.display()))?;

        validate(&definition)?;

        Ok(Schema { definition })
    }
}

/// The stack binds a resolver to Query.message, so the schema must declare
/// that field as a String
///
/// A broken schema caught here fails before any CloudFormation call instead
/// of in the middle of provisioning.
fn validate(definition: &str) -> eyre::Result<()> {
    let doc = async_graphql_parser::parse_schema(definition)
        .map_err(|e| eyre!("Invalid GraphQL schema: {e}"))?;

    let message = doc
        .definitions
        .iter()
        .find_map(|definition| {
            let TypeSystemDefinition::Type(ty) = definition else {
                return None;
            };

            if ty.node.name.node.as_str() != "Query" {
                return None;
            }

            let TypeKind::Object(object) = &ty.node.kind else {
                return None;
            };

            object
                .fields
                .iter()
                .find(|field| field.node.name.node.as_str() == "message")
        })
        .ok_or_else(|| eyre!("The schema must define a Query type with a \"message\" field"))?;

    let ty = &message.node.ty.node;

    match &ty.base {
        BaseType::Named(name) if name.as_str() == "String" => Ok(()),
        _ => Err(eyre!("Query.message must be a String, got {ty}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_query_with_string_message() {
        assert!(validate("type Query { message: String }").is_ok());
    }

    #[test]
    fn accepts_non_null_string_message() {
        assert!(validate("type Query { message: String! }").is_ok());
    }

    #[test]
    fn accepts_extra_types_and_fields() {
        let definition = r#"
            type Query {
                message: String
                other: Int
            }

            type Mutation {
                noop: Boolean
            }
        "#;

        assert!(validate(definition).is_ok());
    }

    #[test]
    fn rejects_schema_without_query() {
        let error = validate("type Mutation { noop: Boolean }").unwrap_err();

        assert!(error.to_string().contains("must define a Query type"));
    }

    #[test]
    fn rejects_query_without_message() {
        let error = validate("type Query { greeting: String }").unwrap_err();

        assert!(error.to_string().contains("message"));
    }

    #[test]
    fn rejects_non_string_message() {
        let error = validate("type Query { message: Int }").unwrap_err();

        assert!(error.to_string().contains("must be a String"));
    }

    #[test]
    fn rejects_list_message() {
        let error = validate("type Query { message: [String] }").unwrap_err();

        assert!(error.to_string().contains("must be a String"));
    }

    #[test]
    fn rejects_unparsable_sdl() {
        let error = validate("type Query { message: ").unwrap_err();

        assert!(error.to_string().contains("Invalid GraphQL schema"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("edgechain-schema-missing/schema.graphql");

        assert!(Schema::from_path(&path).is_err());
    }

    #[test]
    fn reads_schema_from_file() {
        let dir = std::env::temp_dir().join("edgechain-schema-read");
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("schema.graphql");
        std::fs::write(&path, "type Query {\n  message: String\n}\n").unwrap();

        let schema = Schema::from_path(&path).unwrap();

        assert!(schema.definition.contains("message: String"));
    }
}
