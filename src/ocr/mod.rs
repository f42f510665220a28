pub mod pool;
pub mod recognizer;
