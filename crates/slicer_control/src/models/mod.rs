//! Collaborator capabilities and value types shared across the control
//! layer: the geometry backend traits, rasterized layer data, and path
//! queries.

mod layer;
mod print;
mod queries;

pub use layer::LayerImage;
pub use print::{Model, Print, PrintError, PrintObject, PrintResult};
pub use queries::{NullPathQuery, PathQuery};
