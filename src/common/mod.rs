// Common utilities shared by the EWF section parsers

pub mod utf16;

pub use utf16::utf16le_to_string;
