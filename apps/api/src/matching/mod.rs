pub mod engine;
pub mod extractor;
pub mod handlers;
pub mod jd_parser;
pub mod prompts;
pub mod validation;
