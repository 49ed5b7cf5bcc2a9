// Domain layer: records, rate table, query results and the ports the pipeline talks through.

pub mod model;
pub mod ports;
