pub mod error;
pub mod gateway;
pub mod harvest;
pub mod parser;
pub mod results;
pub mod settings;
pub mod util;
