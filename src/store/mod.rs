pub mod drivers;
pub mod orders;
