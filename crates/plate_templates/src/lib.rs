//! # plate_templates
//!
//! Template libraries and packages for plate.
//!
//! A template package is a directory with a `template.yaml` manifest and the
//! files to render. Packages live in libraries, which are searched in
//! configured priority order:
//!
//! - [`LibraryResolver`] maps bare or qualified identifiers to packages
//! - [`LibrarySync`] clones or updates git libraries before resolution
//! - [`PlaceholderRenderer`] renders a package with resolved variables
//!
//! ## Example
//!
//! ```rust,no_run
//! use plate_templates::{Library, LibraryResolver};
//!
//! let resolver = LibraryResolver::new(vec![
//!     Library::at("local", "./templates"),
//!     Library::at("shared", "/opt/plate/templates"),
//! ]);
//!
//! // First library with a compose template named nginx wins
//! let loaded = resolver.load("compose", "nginx").unwrap();
//! println!("{} from {}", loaded.document.metadata.name, loaded.template.library);
//!
//! // Only look in the shared library
//! let shared = resolver.resolve("compose", "nginx.shared").unwrap();
//! println!("{:?}", shared.root);
//! ```

pub mod error;
pub mod identifier;
pub mod library;
pub mod manifest;
pub mod renderer;
pub mod resolver;
pub mod sync;

pub use error::{TemplateError, TemplateResult};
pub use identifier::TemplateId;
pub use library::{resolve_libraries, Library, LibraryConfig, LibraryKind, LibrarySource};
pub use manifest::{TemplateDocument, TemplateMetadata};
pub use renderer::{PlaceholderRenderer, RenderedFile, Renderer};
pub use resolver::{LibraryResolver, LoadedTemplate, ResolvedTemplate, TemplateEntry};
pub use sync::{LibrarySync, SyncOutcome, SyncReport};
