//! Parser diagnostics
//!
//! Every diagnostic carries a stable [`ErrorCode`], a [`Severity`], the
//! [`ParseContext`] phrase it was raised in, and optionally a hint and the
//! location of a related token such as the `{` a missing `}` belongs to.

mod codes;
mod context;
mod error;

pub use codes::ErrorCode;
pub use context::ParseContext;
pub use error::{RelatedInfo, Severity, SyntaxError};
