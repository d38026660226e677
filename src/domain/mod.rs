// Domain layer: batch-import models and the ports to the five remote systems.

pub mod events;
pub mod model;
pub mod ports;
