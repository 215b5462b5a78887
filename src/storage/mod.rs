pub mod layout;
pub mod segment_writer;
pub mod segment_reader;
