pub mod filter_driver;
pub mod pipeline;
