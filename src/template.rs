use crate::config::Config;
use crate::schema::Schema;
use eyre::WrapErr;
use serde_json::{json, Value};

/// Managed "CachingDisabled" policy, so every request reaches the origin
const CACHING_DISABLED_POLICY_ID: &str = "4135ea2d-6df8-44a3-9df3-4b5a84be39ad";

/// Equivalent of allowing all methods on a distribution
const ALL_METHODS: [&str; 7] = ["DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT"];

/// The authorizer accepts every request, it exists to exercise the
/// authorization wiring rather than to guard anything
const AUTHORIZER_CODE: &str = "exports.handler = async () => ({ isAuthorized: true })";

/// How long AppSync caches a single authorization decision
const AUTHORIZER_RESULT_TTL_SECONDS: u32 = 3600;

/// Static resolver templates, the API answers every query with this payload
const REQUEST_MAPPING_TEMPLATE: &str = r#"{ "version": "2018-05-29", "payload": "Hello World!" }"#;
const RESPONSE_MAPPING_TEMPLATE: &str = "$util.toJson($context.result)";

/// CloudFormation template of the whole demo stack
///
/// One GraphQL API guarded by a lambda authorizer, one resolver answering
/// Query.message with a constant, and two CloudFront distributions chained
/// in front of the API: outer -> inner -> AppSync.
#[derive(Clone, Debug)]
pub struct Template {
    name: String,
    authorization: String,
    template: Value,
}

#[derive(Clone, Debug)]
struct CfnResource {
    name: String,
    resource: Value,
}

impl Template {
    pub fn new(config: &Config, schema: &Schema) -> Self {
        let mut template = Template {
            name: config.name.clone(),
            authorization: config.authorization.clone(),
            template: json!({"Resources": {}, "Outputs": {}}),
        };

        for resource in template.authorizer() {
            template.add_resource(resource);
        }

        for resource in template.api(schema) {
            template.add_resource(resource);
        }

        for resource in template.distributions() {
            template.add_resource(resource);
        }

        for (name, output) in template.outputs() {
            template.add_output(name, output);
        }

        template
    }

    /// Template body submitted to CloudFormation
    pub fn body(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(&self.template).wrap_err("Failed to serialize the template")
    }

    /// Add a resource to the CFN template
    fn add_resource(&mut self, CfnResource { name, resource }: CfnResource) {
        self.template
            .get_mut("Resources")
            .unwrap()
            .as_object_mut()
            .unwrap()
            .insert(name, resource);
    }

    fn add_output(&mut self, name: String, output: Value) {
        self.template
            .get_mut("Outputs")
            .unwrap()
            .as_object_mut()
            .unwrap()
            .insert(name, output);
    }

    /// CFN template for the accept-all authorizer function, with its
    /// execution role and the permission for AppSync to invoke it
    fn authorizer(&self) -> Vec<CfnResource> {
        vec![
            CfnResource {
                name: "AuthorizerRole".to_string(),
                resource: json!({
                    "Type": "AWS::IAM::Role",
                    "Properties": {
                        "AssumeRolePolicyDocument": {
                            "Version": "2012-10-17",
                            "Statement": [{
                                "Effect": "Allow",
                                "Principal": {
                                    "Service": ["lambda.amazonaws.com"]
                                },
                                "Action": ["sts:AssumeRole"]
                            }]
                        },
                        "Path": "/",
                        "Policies": [{
                            "PolicyName": "AppendToLogsPolicy",
                            "PolicyDocument": {
                                "Version": "2012-10-17",
                                "Statement": [{
                                    "Effect": "Allow",
                                    "Action": [
                                        "logs:CreateLogGroup",
                                        "logs:CreateLogStream",
                                        "logs:PutLogEvents"
                                    ],
                                    "Resource": "*"
                                }]
                            }
                        }]
                    }
                }),
            },
            CfnResource {
                name: "AuthorizerFunction".to_string(),
                resource: json!({
                    "Type": "AWS::Lambda::Function",
                    "Properties": {
                        "Code": {"ZipFile": AUTHORIZER_CODE},
                        "Handler": "index.handler",
                        "Runtime": "nodejs20.x",
                        "Role": {"Fn::GetAtt": ["AuthorizerRole", "Arn"]}
                    }
                }),
            },
            CfnResource {
                name: "AuthorizerPermission".to_string(),
                resource: json!({
                    "Type": "AWS::Lambda::Permission",
                    "Properties": {
                        "Action": "lambda:InvokeFunction",
                        "FunctionName": {"Ref": "AuthorizerFunction"},
                        "Principal": "appsync.amazonaws.com"
                    }
                }),
            },
        ]
    }

    /// CFN template for the GraphQL API with lambda authorization and
    /// field-level logging, down to the resolver answering Query.message
    /// from a NONE data source
    fn api(&self, schema: &Schema) -> Vec<CfnResource> {
        let name = format!("{}GraphQLApi", self.name);
        let definition = schema.definition.clone();

        vec![
            CfnResource {
                name: "GraphQLApiLogsRole".to_string(),
                resource: json!({
                    "Type": "AWS::IAM::Role",
                    "Properties": {
                        "AssumeRolePolicyDocument": {
                            "Version": "2012-10-17",
                            "Statement": [{
                                "Effect": "Allow",
                                "Principal": {
                                    "Service": ["appsync.amazonaws.com"]
                                },
                                "Action": ["sts:AssumeRole"]
                            }]
                        },
                        "ManagedPolicyArns": [
                            "arn:aws:iam::aws:policy/service-role/AWSAppSyncPushToCloudWatchLogs"
                        ]
                    }
                }),
            },
            CfnResource {
                name: "GraphQLApi".to_string(),
                resource: json!({
                    "Type": "AWS::AppSync::GraphQLApi",
                    "Properties": {
                        "Name": name,
                        "AuthenticationType": "AWS_LAMBDA",
                        "LambdaAuthorizerConfig": {
                            "AuthorizerUri": {"Fn::GetAtt": ["AuthorizerFunction", "Arn"]},
                            "AuthorizerResultTtlInSeconds": AUTHORIZER_RESULT_TTL_SECONDS
                        },
                        "LogConfig": {
                            "FieldLogLevel": "ALL",
                            "CloudWatchLogsRoleArn": {"Fn::GetAtt": ["GraphQLApiLogsRole", "Arn"]}
                        }
                    }
                }),
            },
            CfnResource {
                name: "GraphQLApiSchema".to_string(),
                resource: json!({
                    "Type": "AWS::AppSync::GraphQLSchema",
                    "Properties": {
                        "ApiId": {"Fn::GetAtt": ["GraphQLApi", "ApiId"]},
                        "Definition": definition
                    }
                }),
            },
            CfnResource {
                name: "NoneDataSource".to_string(),
                resource: json!({
                    "Type": "AWS::AppSync::DataSource",
                    "Properties": {
                        "ApiId": {"Fn::GetAtt": ["GraphQLApi", "ApiId"]},
                        "Name": "NoneDataSource",
                        "Type": "NONE"
                    }
                }),
            },
            CfnResource {
                name: "QueryMessageResolver".to_string(),
                resource: json!({
                    "Type": "AWS::AppSync::Resolver",
                    // The resolver can only be created once the schema is live
                    "DependsOn": "GraphQLApiSchema",
                    "Properties": {
                        "ApiId": {"Fn::GetAtt": ["GraphQLApi", "ApiId"]},
                        "TypeName": "Query",
                        "FieldName": "message",
                        "DataSourceName": {"Fn::GetAtt": ["NoneDataSource", "Name"]},
                        "RequestMappingTemplate": REQUEST_MAPPING_TEMPLATE,
                        "ResponseMappingTemplate": RESPONSE_MAPPING_TEMPLATE
                    }
                }),
            },
        ]
    }

    /// CFN template for the edge: two chained distributions, the inner one
    /// pointing at the API host and the outer one at the inner's domain
    fn distributions(&self) -> Vec<CfnResource> {
        let authorization = self.authorization.clone();

        vec![
            CfnResource {
                name: "InnerDistribution".to_string(),
                resource: json!({
                    "Type": "AWS::CloudFront::Distribution",
                    "Properties": {
                        "DistributionConfig": {
                            "Comment": format!("{}InnerDistribution", self.name),
                            "Enabled": true,
                            "DefaultCacheBehavior": {
                                "AllowedMethods": ALL_METHODS,
                                "CachePolicyId": CACHING_DISABLED_POLICY_ID,
                                "TargetOriginId": "GraphQLApiOrigin",
                                "ViewerProtocolPolicy": "allow-all"
                            },
                            "Origins": [{
                                "Id": "GraphQLApiOrigin",

                                // The GraphQLUrl attribute is a full URL, while an origin
                                // needs a bare hostname. Splitting on "/" leaves the
                                // authority at index 2: ["https:", "", "host", ...]
                                "DomainName": {
                                    "Fn::Select": [2, {"Fn::Split": ["/", {"Fn::GetAtt": ["GraphQLApi", "GraphQLUrl"]}]}]
                                },
                                "CustomOriginConfig": {
                                    "OriginProtocolPolicy": "https-only"
                                },
                                "OriginCustomHeaders": [{
                                    "HeaderName": "authorization",
                                    "HeaderValue": authorization
                                }]
                            }]
                        }
                    }
                }),
            },
            CfnResource {
                name: "OuterDistribution".to_string(),
                resource: json!({
                    "Type": "AWS::CloudFront::Distribution",
                    "Properties": {
                        "DistributionConfig": {
                            "Comment": format!("{}OuterDistribution", self.name),
                            "Enabled": true,
                            "DefaultCacheBehavior": {
                                "AllowedMethods": ALL_METHODS,
                                "CachePolicyId": CACHING_DISABLED_POLICY_ID,
                                "TargetOriginId": "InnerDistributionOrigin",
                                "ViewerProtocolPolicy": "allow-all"
                            },
                            "Origins": [{
                                "Id": "InnerDistributionOrigin",
                                "DomainName": {"Fn::GetAtt": ["InnerDistribution", "DomainName"]},
                                "CustomOriginConfig": {
                                    "OriginProtocolPolicy": "https-only"
                                }
                            }]
                        }
                    }
                }),
            },
        ]
    }

    /// Both generated hostnames, surfaced for operators and scripts
    fn outputs(&self) -> Vec<(String, Value)> {
        vec![
            (
                "InnerDistributionDomainName".to_string(),
                json!({"Value": {"Fn::GetAtt": ["InnerDistribution", "DomainName"]}}),
            ),
            (
                "OuterDistributionDomainName".to_string(),
                json!({"Value": {"Fn::GetAtt": ["OuterDistribution", "DomainName"]}}),
            ),
        ]
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.template.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_with(authorization: &str) -> Template {
        let config = Config {
            name: "edgechain-demo".to_string(),
            schema: "schema.graphql".into(),
            authorization: authorization.to_string(),
        };

        let schema = Schema {
            definition: "type Query {\n  message: String\n}\n".to_string(),
        };

        Template::new(&config, &schema)
    }

    fn template() -> Template {
        template_with("demo-authorization-header")
    }

    fn resource<'a>(template: &'a Template, name: &str) -> &'a Value {
        template
            .template
            .pointer(&format!("/Resources/{name}"))
            .unwrap()
    }

    #[test]
    fn lambda_authorization_is_the_only_auth_mode() {
        let template = template();
        let api = resource(&template, "GraphQLApi");

        assert_eq!(
            api.pointer("/Properties/AuthenticationType").unwrap(),
            "AWS_LAMBDA"
        );
        assert!(api
            .pointer("/Properties/AdditionalAuthenticationProviders")
            .is_none());
    }

    #[test]
    fn authorizer_accepts_every_request() {
        let template = template();
        let function = resource(&template, "AuthorizerFunction");

        assert_eq!(
            function.pointer("/Properties/Code/ZipFile").unwrap(),
            AUTHORIZER_CODE
        );
        assert_eq!(
            function.pointer("/Properties/Handler").unwrap(),
            "index.handler"
        );
        assert_eq!(
            function.pointer("/Properties/Role").unwrap(),
            &json!({"Fn::GetAtt": ["AuthorizerRole", "Arn"]})
        );
    }

    #[test]
    fn api_points_at_the_authorizer_function() {
        let template = template();
        let config = resource(&template, "GraphQLApi")
            .pointer("/Properties/LambdaAuthorizerConfig")
            .unwrap();

        assert_eq!(
            config.get("AuthorizerUri").unwrap(),
            &json!({"Fn::GetAtt": ["AuthorizerFunction", "Arn"]})
        );
        assert_eq!(config.get("AuthorizerResultTtlInSeconds").unwrap(), 3600);
    }

    #[test]
    fn appsync_is_allowed_to_invoke_the_authorizer() {
        let template = template();
        let permission = resource(&template, "AuthorizerPermission");

        assert_eq!(
            permission.pointer("/Properties/Action").unwrap(),
            "lambda:InvokeFunction"
        );
        assert_eq!(
            permission.pointer("/Properties/FunctionName").unwrap(),
            &json!({"Ref": "AuthorizerFunction"})
        );
        assert_eq!(
            permission.pointer("/Properties/Principal").unwrap(),
            "appsync.amazonaws.com"
        );
    }

    #[test]
    fn api_name_is_prefixed_with_the_stack_name() {
        let template = template();

        assert_eq!(
            resource(&template, "GraphQLApi")
                .pointer("/Properties/Name")
                .unwrap(),
            "edgechain-demoGraphQLApi"
        );
    }

    #[test]
    fn field_logging_is_enabled() {
        let template = template();
        let config = resource(&template, "GraphQLApi")
            .pointer("/Properties/LogConfig")
            .unwrap();

        assert_eq!(config.get("FieldLogLevel").unwrap(), "ALL");
        assert_eq!(
            config.get("CloudWatchLogsRoleArn").unwrap(),
            &json!({"Fn::GetAtt": ["GraphQLApiLogsRole", "Arn"]})
        );
    }

    #[test]
    fn schema_definition_is_embedded_verbatim() {
        let template = template();
        let schema = resource(&template, "GraphQLApiSchema");

        assert_eq!(
            schema.pointer("/Properties/Definition").unwrap(),
            "type Query {\n  message: String\n}\n"
        );
        assert_eq!(
            schema.pointer("/Properties/ApiId").unwrap(),
            &json!({"Fn::GetAtt": ["GraphQLApi", "ApiId"]})
        );
    }

    #[test]
    fn data_source_resolves_nothing() {
        let template = template();
        let data_source = resource(&template, "NoneDataSource");

        assert_eq!(data_source.pointer("/Properties/Type").unwrap(), "NONE");
        assert_eq!(
            data_source.pointer("/Properties/Name").unwrap(),
            "NoneDataSource"
        );
    }

    #[test]
    fn a_single_resolver_bound_to_query_message() {
        let template = template();
        let resources = template
            .template
            .pointer("/Resources")
            .unwrap()
            .as_object()
            .unwrap();

        let resolvers: Vec<&Value> = resources
            .values()
            .filter(|r| r.get("Type").unwrap() == "AWS::AppSync::Resolver")
            .collect();

        assert_eq!(resolvers.len(), 1);
        assert_eq!(resolvers[0].pointer("/Properties/TypeName").unwrap(), "Query");
        assert_eq!(
            resolvers[0].pointer("/Properties/FieldName").unwrap(),
            "message"
        );
        assert_eq!(
            resolvers[0].pointer("/Properties/DataSourceName").unwrap(),
            &json!({"Fn::GetAtt": ["NoneDataSource", "Name"]})
        );
    }

    #[test]
    fn resolver_returns_the_static_payload() {
        let template = template();
        let resolver = resource(&template, "QueryMessageResolver");

        assert_eq!(
            resolver
                .pointer("/Properties/RequestMappingTemplate")
                .unwrap(),
            r#"{ "version": "2018-05-29", "payload": "Hello World!" }"#
        );
        assert_eq!(
            resolver
                .pointer("/Properties/ResponseMappingTemplate")
                .unwrap(),
            "$util.toJson($context.result)"
        );
    }

    #[test]
    fn resolver_waits_for_the_schema() {
        let template = template();

        assert_eq!(
            resource(&template, "QueryMessageResolver")
                .get("DependsOn")
                .unwrap(),
            "GraphQLApiSchema"
        );
    }

    #[test]
    fn inner_origin_is_the_api_host() {
        let template = template();

        assert_eq!(
            resource(&template, "InnerDistribution")
                .pointer("/Properties/DistributionConfig/Origins/0/DomainName")
                .unwrap(),
            &json!({
                "Fn::Select": [2, {"Fn::Split": ["/", {"Fn::GetAtt": ["GraphQLApi", "GraphQLUrl"]}]}]
            })
        );
    }

    #[test]
    fn outer_origin_is_the_inner_distribution() {
        let template = template();

        assert_eq!(
            resource(&template, "OuterDistribution")
                .pointer("/Properties/DistributionConfig/Origins/0/DomainName")
                .unwrap(),
            &json!({"Fn::GetAtt": ["InnerDistribution", "DomainName"]})
        );
    }

    #[test]
    fn caching_is_disabled_on_both_distributions() {
        let template = template();

        for name in ["InnerDistribution", "OuterDistribution"] {
            assert_eq!(
                resource(&template, name)
                    .pointer("/Properties/DistributionConfig/DefaultCacheBehavior/CachePolicyId")
                    .unwrap(),
                CACHING_DISABLED_POLICY_ID,
                "{name}"
            );
        }
    }

    #[test]
    fn all_methods_are_allowed_on_both_distributions() {
        let template = template();

        for name in ["InnerDistribution", "OuterDistribution"] {
            let methods = resource(&template, name)
                .pointer("/Properties/DistributionConfig/DefaultCacheBehavior/AllowedMethods")
                .unwrap()
                .as_array()
                .unwrap();

            assert_eq!(methods.len(), 7, "{name}");

            for method in ALL_METHODS {
                assert!(methods.contains(&json!(method)), "{name} misses {method}");
            }
        }
    }

    #[test]
    fn behaviors_target_the_single_origin_of_each_distribution() {
        let template = template();

        for name in ["InnerDistribution", "OuterDistribution"] {
            let config = resource(&template, name)
                .pointer("/Properties/DistributionConfig")
                .unwrap();

            let origins = config.get("Origins").unwrap().as_array().unwrap();
            assert_eq!(origins.len(), 1, "{name}");

            assert_eq!(
                config.pointer("/DefaultCacheBehavior/TargetOriginId").unwrap(),
                origins[0].get("Id").unwrap(),
                "{name}"
            );
        }
    }

    #[test]
    fn origins_are_reached_over_https_only() {
        let template = template();

        for name in ["InnerDistribution", "OuterDistribution"] {
            assert_eq!(
                resource(&template, name)
                    .pointer(
                        "/Properties/DistributionConfig/Origins/0/CustomOriginConfig/OriginProtocolPolicy"
                    )
                    .unwrap(),
                "https-only",
                "{name}"
            );
        }
    }

    #[test]
    fn only_the_inner_origin_carries_the_authorization_header() {
        let template = template_with("shared-secret");

        assert_eq!(
            resource(&template, "InnerDistribution")
                .pointer("/Properties/DistributionConfig/Origins/0/OriginCustomHeaders")
                .unwrap(),
            &json!([{"HeaderName": "authorization", "HeaderValue": "shared-secret"}])
        );
        assert!(resource(&template, "OuterDistribution")
            .pointer("/Properties/DistributionConfig/Origins/0/OriginCustomHeaders")
            .is_none());
    }

    #[test]
    fn outputs_expose_both_domain_names() {
        let template = template();

        assert_eq!(
            template
                .template
                .pointer("/Outputs/InnerDistributionDomainName/Value")
                .unwrap(),
            &json!({"Fn::GetAtt": ["InnerDistribution", "DomainName"]})
        );
        assert_eq!(
            template
                .template
                .pointer("/Outputs/OuterDistributionDomainName/Value")
                .unwrap(),
            &json!({"Fn::GetAtt": ["OuterDistribution", "DomainName"]})
        );
    }

    #[test]
    fn body_is_valid_json() {
        let body = template().body().unwrap();
        let parsed: Value = serde_json::from_str(&body).unwrap();

        assert!(parsed.get("Resources").is_some());
        assert!(parsed.get("Outputs").is_some());
    }
}
