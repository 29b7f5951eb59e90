//! Recipe execution: the concurrent task runner, the recipe contract and
//! registry, document inputs, and result output.

pub mod document;
pub mod executor;
pub mod map;
pub mod recipe;
pub mod recipes;
pub mod registry;
pub mod results;

pub use document::Document;
pub use executor::{RecipeExecutor, ResultSet, STANDALONE_KEY};
pub use map::{Progress, map_async, map_async_settled};
pub use recipe::{Recipe, RecipeContext};
pub use registry::{RecipeEntry, RecipeRegistry};
pub use results::ResultsWriter;
