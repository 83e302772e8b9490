pub mod matching;
pub mod record;
