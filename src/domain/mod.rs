// Domain layer: data model and ports (interfaces to external capabilities).

pub mod model;
pub mod ports;
