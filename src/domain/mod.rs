// Domain layer: core models, object key layout and ports (interfaces to the external services).

pub mod keys;
pub mod model;
pub mod ports;
