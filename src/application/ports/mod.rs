pub mod hosting_provider;
