pub mod advisor;
pub mod model;
pub mod scorer;
pub mod weather;
