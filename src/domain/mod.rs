// Domain layer: records and the service ports the rest of the crate talks to.

pub mod model;
pub mod ports;
