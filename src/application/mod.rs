//! Application layer: source adapters, loading and API descriptors
//!
//! This layer turns source files into codices and depends on the domain only.

pub mod api;
pub mod error;
pub mod error_ext;
pub mod loader;
pub mod progress;
pub mod rev10;
pub mod rev10cm;
pub mod rev11;
pub mod xml;

pub use api::{check_status, parse_clinical_tables, ApiRequest};
pub use error::{ApiError, ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use loader::{discover_sources, load_codex, CodexSource};
