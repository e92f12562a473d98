// Path Planning algorithms module

pub mod boustrophedon;

pub use boustrophedon::*;
