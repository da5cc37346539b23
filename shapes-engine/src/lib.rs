pub mod comparator;
pub mod repository;
pub mod sort;
pub mod specification;
pub mod warehouse;

pub mod errors {
    use shapes_core::errors::ComputationError;
    use shapes_core::shape::{Metric, ShapeId};
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("shape with id {0} already exists")]
        DuplicateKey(ShapeId),
        #[error("invalid argument: {0}")]
        InvalidArgument(String),
        #[error("cannot compute {property} for {kind} {id}")]
        UnsupportedShape {
            id: ShapeId,
            kind: &'static str,
            property: Metric,
        },
        #[error(transparent)]
        Computation(#[from] ComputationError),
    }
}
