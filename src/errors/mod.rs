pub mod types;

pub use types::TagscopeError;
