use eyre::WrapErr;
use rust_dotenv::dotenv::DotEnv;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_STACK_NAME: &str = "edgechain-demo";
const DEFAULT_SCHEMA_PATH: &str = "schema.graphql";
const DEFAULT_AUTHORIZATION: &str = "demo-authorization-header";

/// Deployment configuration
///
/// Maps one2one from edgechain.toml with a default for every field, so the
/// tool works out of the box in a directory holding nothing but a schema.
#[derive(Debug, Clone)]
pub struct Config {
    /// Stack name, also the prefix for names of resources inside the stack
    pub name: String,

    /// Path to the GraphQL schema file
    pub schema: PathBuf,

    /// Value of the "authorization" header the edge attaches to API requests
    pub authorization: String,
}

/// FileConfig is the structure of edgechain.toml
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    /// [stack]
    /// name = "my-stack"
    /// schema = "api/schema.graphql"
    #[serde(default)]
    stack: StackSection,

    /// [origin]
    /// authorization = "shared-secret"
    #[serde(default)]
    origin: OriginSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StackSection {
    name: Option<String>,
    schema: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OriginSection {
    authorization: Option<String>,
}

impl Config {
    pub fn from_current_dir() -> eyre::Result<Self> {
        let path = std::env::current_dir().wrap_err("Failed to resolve the working directory")?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> eyre::Result<Self> {
        let file = FileConfig::from_path(path)?;

        // Fallback to the default name if the key is set but empty
        let name = file
            .stack
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_STACK_NAME.to_string());

        let authorization = authorization_from_dotenv()
            .or(file.origin.authorization)
            .unwrap_or_else(|| DEFAULT_AUTHORIZATION.to_string());

        Ok(Config {
            name,
            schema: path.join(
                file.stack
                    .schema
                    .unwrap_or_else(|| DEFAULT_SCHEMA_PATH.into()),
            ),
            authorization,
        })
    }
}

impl FileConfig {
    fn from_path(path: &Path) -> eyre::Result<Self> {
        let config_toml_path = path.join("edgechain.toml");

        if let Ok(toml_string) = std::fs::read_to_string(&config_toml_path) {
            toml::from_str(&toml_string).wrap_err("Failed to parse edgechain.toml")
        } else {
            // Return default config if edgechain.toml is not found
            Ok(FileConfig::default())
        }
    }
}

/// The header value is a shared secret between the two edge layers, so it can
/// be kept out of the config file and set in .env instead, which takes priority
fn authorization_from_dotenv() -> Option<String> {
    // rust_dotenv complains on stderr when the file is missing
    if !Path::new(".env").exists() {
        log::debug!("No .env file found");
        return None;
    }

    DotEnv::new("")
        .all_vars()
        .get("ORIGIN_AUTHORIZATION")
        .cloned()
}
