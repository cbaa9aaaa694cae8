pub mod excel_read;
pub mod tsv_write;
