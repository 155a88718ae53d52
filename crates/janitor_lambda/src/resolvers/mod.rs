pub mod functions;
pub mod layers;
