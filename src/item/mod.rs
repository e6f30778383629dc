/// CSV reader and writer binding rows to typed records.
pub mod csv;
