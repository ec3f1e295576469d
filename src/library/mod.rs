pub mod catalog;
pub mod models;
pub mod patterns;
pub mod scanner;
pub mod show_name;

pub use catalog::{Catalog, Resolver};
pub use models::{ClassificationResult, Episode, RawMatch, Show};
pub use patterns::{PatternKind, PatternRegistry, PatternRule};
pub use scanner::Scanner;
pub use show_name::parse_show_name;
