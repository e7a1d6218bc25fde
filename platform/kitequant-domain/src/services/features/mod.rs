mod rolling;

pub use rolling::RollingSma;
