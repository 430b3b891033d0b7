pub mod config;
pub mod discretization;
pub mod logging;
pub mod models;
pub mod numerics;
pub mod physics;
pub mod processing;
