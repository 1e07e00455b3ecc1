pub mod change;
pub mod indicator;
pub mod sentiment;
