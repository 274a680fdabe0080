//! Application ("dogu") descriptors and their registries.
//!
//! A registry root holds, per dogu, one serialized body per version and a
//! `current` pointer naming the active version:
//!
//! ```text
//! <root>/<simple name>/current   -> "1.2.3"
//! <root>/<simple name>/1.2.3     -> serialized descriptor
//! ```
//!
//! Two roots exist side by side while consumers migrate between descriptor
//! formats; [`CombinedDoguRegistry`] keeps them in step.

mod combined;
mod format;
mod model;
mod registry;

pub use combined::*;
pub use format::*;
pub use model::*;
pub use registry::*;
