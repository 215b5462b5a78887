pub mod pretokenized;
