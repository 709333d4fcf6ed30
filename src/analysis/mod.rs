pub mod grouping;
pub mod primary_file;
pub mod resolve;
pub mod scoring;
