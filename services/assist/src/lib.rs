pub mod app;
pub mod config;
pub mod console_speech;
pub mod document;
pub mod gemini;
pub mod mathpix;
pub mod offline;
pub mod repl;
