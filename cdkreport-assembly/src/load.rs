use crate::environment::{Environment, has_placeholders, resolve_placeholders};
use crate::manifest::{
    ArtifactManifest, AssemblyManifest, LookupRole, NESTED_ASSEMBLY_ARTIFACT,
    NestedAssemblyProperties, STACK_ARTIFACT, StackProperties,
};
use crate::order::{Node, topological_sort};
use camino::{Utf8Path, Utf8PathBuf};
use cdkreport_types::stack::StackDescriptor;
use fs_err as fs;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("cloud assembly not found: {path}")]
    NotFound { path: Utf8PathBuf },

    #[error("invalid cloud assembly manifest {path}: {message}")]
    ManifestParse { path: Utf8PathBuf, message: String },
}

impl AssemblyError {
    fn parse(path: &Utf8Path, message: impl Into<String>) -> Self {
        AssemblyError::ManifestParse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Load every stack in the assembly at `dir`, nested assemblies included.
///
/// Stacks of one manifest come out in dependency order, followed by the stacks
/// of its nested assemblies in declaration order.
pub fn load(dir: &Utf8Path) -> Result<Vec<StackDescriptor>, AssemblyError> {
    if !dir.is_dir() {
        return Err(AssemblyError::NotFound {
            path: dir.to_path_buf(),
        });
    }
    let manifest_path = dir.join(MANIFEST_FILE_NAME);
    if !manifest_path.is_file() {
        return Err(AssemblyError::NotFound {
            path: manifest_path,
        });
    }

    let stacks = load_recursive(dir)?;

    if let Some(duplicate) = first_duplicate_name(&stacks) {
        return Err(AssemblyError::parse(
            &manifest_path,
            format!("stack name '{duplicate}' appears more than once"),
        ));
    }

    debug!(dir = %dir, stacks = stacks.len(), "loaded cloud assembly");
    Ok(stacks)
}

fn first_duplicate_name(stacks: &[StackDescriptor]) -> Option<String> {
    let mut seen = HashSet::new();
    stacks
        .iter()
        .find(|s| !seen.insert(s.name.as_str()))
        .map(|s| s.name.clone())
}

fn load_recursive(dir: &Utf8Path) -> Result<Vec<StackDescriptor>, AssemblyError> {
    let manifest_path = dir.join(MANIFEST_FILE_NAME);
    let raw = fs::read_to_string(&manifest_path)
        .map_err(|e| AssemblyError::parse(&manifest_path, e.to_string()))?;
    let manifest: AssemblyManifest = serde_json::from_str(&raw)
        .map_err(|e| AssemblyError::parse(&manifest_path, e.to_string()))?;

    debug!(
        path = %manifest_path,
        version = manifest.version.as_deref().unwrap_or("unknown"),
        artifacts = manifest.artifacts.len(),
        "parsed manifest"
    );

    let mut stack_nodes = Vec::new();
    let mut nested = Vec::new();

    for (artifact_id, value) in manifest.artifacts {
        let artifact: ArtifactManifest = serde_json::from_value(value).map_err(|e| {
            AssemblyError::parse(&manifest_path, format!("artifact '{artifact_id}': {e}"))
        })?;

        match artifact.kind.as_str() {
            STACK_ARTIFACT => {
                let descriptor = stack_descriptor(&manifest_path, &artifact_id, &artifact)?;
                stack_nodes.push(Node {
                    id: artifact_id,
                    dependencies: artifact.dependencies,
                    value: descriptor,
                });
            }
            NESTED_ASSEMBLY_ARTIFACT => {
                let props: NestedAssemblyProperties = artifact
                    .properties
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| {
                        AssemblyError::parse(&manifest_path, format!("artifact '{artifact_id}': {e}"))
                    })?
                    .ok_or_else(|| {
                        AssemblyError::parse(
                            &manifest_path,
                            format!("nested assembly '{artifact_id}' has no directoryName"),
                        )
                    })?;
                nested.push((artifact_id, dir.join(props.directory_name)));
            }
            other => {
                debug!(artifact = %artifact_id, kind = other, "skipping non-stack artifact");
            }
        }
    }

    let mut stacks = topological_sort(stack_nodes).map_err(|cycle| {
        AssemblyError::parse(
            &manifest_path,
            format!("stack dependencies form a cycle: {}", cycle.join(", ")),
        )
    })?;

    for (artifact_id, nested_dir) in nested {
        if !nested_dir.join(MANIFEST_FILE_NAME).is_file() {
            return Err(AssemblyError::parse(
                &manifest_path,
                format!("nested assembly '{artifact_id}' has no manifest at {nested_dir}"),
            ));
        }
        debug!(artifact = %artifact_id, dir = %nested_dir, "descending into nested assembly");
        stacks.extend(load_recursive(&nested_dir)?);
    }

    Ok(stacks)
}

fn stack_descriptor(
    manifest_path: &Utf8Path,
    artifact_id: &str,
    artifact: &ArtifactManifest,
) -> Result<StackDescriptor, AssemblyError> {
    let env = match artifact.environment.as_deref() {
        Some(raw) => Environment::parse(raw).ok_or_else(|| {
            AssemblyError::parse(
                manifest_path,
                format!("stack '{artifact_id}' has malformed environment '{raw}'"),
            )
        })?,
        None => Environment::default(),
    };

    let props: StackProperties = match &artifact.properties {
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            AssemblyError::parse(manifest_path, format!("stack '{artifact_id}': {e}"))
        })?,
        None => StackProperties::default(),
    };

    let Some(LookupRole { arn }) = props.lookup_role else {
        return Err(AssemblyError::parse(
            manifest_path,
            format!("stack '{artifact_id}' has no lookup role"),
        ));
    };

    // Agnostic stacks keep their placeholders until the fetcher binds them to
    // the caller's account and region.
    let lookup_role_arn = resolve_placeholders(&arn, &env);
    if has_placeholders(&lookup_role_arn) {
        debug!(
            artifact = %artifact_id,
            lookup_role = %lookup_role_arn,
            "lookup role left unresolved for environment-agnostic stack"
        );
    }

    Ok(StackDescriptor {
        name: props.stack_name.unwrap_or_else(|| artifact_id.to_string()),
        lookup_role_arn,
        region: env.region,
        account: env.account,
        artifact_id: artifact_id.to_string(),
    })
}
