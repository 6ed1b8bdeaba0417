pub mod filename;
pub mod output_file;
