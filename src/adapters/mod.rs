pub mod hosting;
pub mod http;
pub mod persistence;
