// vocabdb - A read-only SQL gateway over a SQLite vocabulary store
// This is the library root that exposes the public API

pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod query;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{GateError, Result};
pub use gate::{ActionToken, QueryGate};
pub use query::{
    ClassificationMode, OpenOptions, QueryClass, QueryClassifier, QueryExecutor, QueryRunner,
    ResultSet,
};
