//! Figure document model, loading and structural validation.

pub(crate) mod load;
pub(crate) mod model;
pub(crate) mod validate;
