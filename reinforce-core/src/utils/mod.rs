pub mod loss;
pub mod returns;
