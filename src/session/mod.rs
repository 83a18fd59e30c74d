//! Build sessions: dispatch in declaration order, composition and concatenation.

pub(crate) mod build;
pub(crate) mod dispatch;
pub(crate) mod report;
