// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Geometry generation and GPU resource lifecycle for molecular
//! representations.
//!
//! A representation turns structure units into draw items. Builders produce
//! CPU-side geometry (tessellated meshes or ray-cast impostor primitives),
//! which is installed into a schema-checked record of versioned value cells.
//! The GPU side mirrors that record and uploads only cells whose version
//! moved.
//!
//! # Key entry points
//!
//! - [`repr::polymer_backbone_cylinder_visual`] - backbone cylinders for one
//!   structure group, mesh or impostor depending on the device
//! - [`repr::UnitsRepresentation`] - one visual per symmetry group of a
//!   [`structure::Structure`]
//! - [`renderable::Renderable`] - a validated values record plus its schema
//! - [`gpu::RenderItem`] - version-skipping upload of a renderable
//! - [`options::Options`] - TOML-backed representation parameters
//!
//! # Update model
//!
//! Each [`repr::Visual::update`] reports a [`repr::VisualUpdateState`]. Only
//! a geometry rebuild replaces vertex data; theme, transform and size-factor
//! changes rewrite the affected cells in place, and identical inputs write
//! nothing at all.

pub mod error;
pub mod geometry;
pub mod gpu;
pub mod options;
pub mod renderable;
pub mod repr;
pub mod schema;
pub mod structure;
pub mod theme;

pub use error::ReprError;
