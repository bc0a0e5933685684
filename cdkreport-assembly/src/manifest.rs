//! The subset of the Cloud Assembly manifest schema cdkreport reads.

use serde::Deserialize;
use serde_json::{Map, Value};

pub(crate) const STACK_ARTIFACT: &str = "aws:cloudformation:stack";
pub(crate) const NESTED_ASSEMBLY_ARTIFACT: &str = "cdk:cloud-assembly";

#[derive(Debug, Deserialize)]
pub(crate) struct AssemblyManifest {
    #[serde(default)]
    pub version: Option<String>,

    /// Kept as a raw map so declaration order survives deserialization.
    #[serde(default)]
    pub artifacts: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtifactManifest {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub environment: Option<String>,

    #[serde(default)]
    pub properties: Option<Value>,

    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StackProperties {
    #[serde(default)]
    pub stack_name: Option<String>,

    #[serde(default)]
    pub lookup_role: Option<LookupRole>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupRole {
    pub arn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NestedAssemblyProperties {
    pub directory_name: String,
}
