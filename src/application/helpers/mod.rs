pub mod challenge;
pub mod host_parsing;
pub mod redirect_graph;
