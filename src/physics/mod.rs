pub mod bc;
pub mod collision;
pub mod field;
pub mod particle;
