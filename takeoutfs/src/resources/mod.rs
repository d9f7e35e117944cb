//! Resource index over files discovered in an export bundle.
//!
//! A scanner walks the bundle once and registers every content file as a
//! [`Resource`]: a handle onto one [`Entry`](crate::vfs::Entry) plus the
//! container it belongs to (album, blog). Rendering code later resolves
//! references found in documents against the index:
//!
//! ```text
//!                    ┌─────────────────────────────┐
//!  add(container, …) │        ResourceIndex        │
//! ──────────────────►│  by_path:      path → R     │
//!                    │  by_base:      name → [R]   │
//!                    │  by_container: name → [R]   │
//!                    └──────────────┬──────────────┘
//!                                   │ Arc<Resource>
//!                                   ▼
//!                        Resource::open(&fs)
//! ```
//!
//! Base names repeat across unrelated containers (`IMG_0001.jpg`), so the
//! date-aware lookup picks the candidate created closest to the referencing
//! document.

mod index;
mod resource;

pub use index::ResourceIndex;
pub use resource::{Resource, ResourceMetadata};
