// Query module - handles statement classification, execution and result shaping
pub mod executor;
pub mod parser;
pub mod result;

pub use executor::{OpenOptions, QueryExecutor, QueryRunner};
pub use parser::{ClassificationMode, QueryClass, QueryClassifier};
pub use result::{format_empty, JsonRow, RawResult, ResultSet};
