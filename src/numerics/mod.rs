pub mod interpolation;
pub mod relaxation;
pub mod timing;
pub mod trajectory;
