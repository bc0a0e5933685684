//! Embeddable core library for cdkreport.
//!
//! Provides a clap-free, I/O-abstracted pipeline: select stacks from a Cloud
//! Assembly, then fetch one changeset per stack through port traits.
//!
//! # Port traits
//!
//! All provider I/O is abstracted behind port traits in [`ports`]:
//! - [`CredentialProvider`](ports::CredentialProvider): assume a stack's lookup role
//! - [`ChangesetClient`](ports::ChangesetClient): describe a named changeset
//!
//! The [`adapters`] module provides in-memory implementations for embedding
//! and tests; the AWS-backed ones live in `cdkreport-aws`.
//!
//! # Entry points
//!
//! - [`select_stacks`](pipeline::select_stacks): load the assembly and apply the selection
//! - [`gather`](pipeline::gather): fetch every selected stack's changeset

pub mod adapters;
pub mod fetch;
pub mod pipeline;
pub mod ports;
pub mod retry;
pub mod selector;
pub mod settings;

pub use cdkreport_assembly::AssemblyError;
