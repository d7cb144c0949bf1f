// ============================================================================
// spark-features - Core Module
// Constants, thread-local context, and identity types
// ============================================================================

pub mod constants;
pub mod context;
pub mod types;
