pub mod domain;
pub mod domain_import;
pub mod routing;
pub mod verification;
