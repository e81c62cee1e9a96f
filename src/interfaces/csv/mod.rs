pub mod command_reader;
pub mod invoice_writer;
