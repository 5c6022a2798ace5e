// Database module
// This module handles SQLite storage for papers and context snippets

pub mod sqlite;

pub use sqlite::*;
