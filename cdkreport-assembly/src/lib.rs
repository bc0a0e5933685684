//! Cloud Assembly ingestion.
//!
//! Reads the `manifest.json` the CDK toolchain writes into its output
//! directory (usually `cdk.out`) and exposes one [`StackDescriptor`] per stack
//! artifact, with the stack's lookup role ARN already resolved. Only the fields
//! needed to query changesets are read; everything else in the manifest is
//! ignored.
//!
//! [`StackDescriptor`]: cdkreport_types::stack::StackDescriptor

mod environment;
mod load;
mod manifest;
mod order;

pub use environment::{Environment, has_placeholders, partition_for_region, resolve_placeholders};
pub use load::{AssemblyError, MANIFEST_FILE_NAME, load};
