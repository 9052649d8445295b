//! USD (Universal Scene Description) scene input.
//!
//! This module parses USDA (ASCII) layers and maps them onto the levelgen
//! scene model. Only placement data is read; geometry is skipped.
//!
//! ## Supported USD Features
//!
//! - `Xform` / `Scope` hierarchies with xformOps
//! - `Mesh` prims (as mesh data blocks)
//! - Reference arcs (`references = @asset@</Prim>`) as linked instance collections
//!
//! ## Not Supported
//!
//! - Binary `.usdc` format
//! - Payloads, variants, inherits and specializes
//! - `xformOpOrder` reordering (ops apply in authored line order)
//! - Animation / time samples
//!
//! # Example
//!
//! ```ignore
//! use levelgen_core::usd::load_usda;
//!
//! let scene = load_usda("levels/forest.usda")?;
//! println!("Loaded {} objects, {} collections",
//!     scene.object_count(),
//!     scene.collection_count());
//! ```

mod types;
mod parser;
mod loader;

pub use types::*;
pub use parser::*;
pub use loader::*;
