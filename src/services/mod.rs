pub mod bank;
pub mod progress;
pub mod quiz;
pub mod tokenize;
