pub mod config;
pub mod outcome;
pub mod request;


pub use config::*;
pub use outcome::*;
pub use request::*;
