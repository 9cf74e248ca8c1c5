//! Path templates and the query-string codec.

pub mod query;
mod template;

pub use template::PathTemplate;
