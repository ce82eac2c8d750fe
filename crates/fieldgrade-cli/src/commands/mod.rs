pub mod counters;
pub mod grade;
pub mod init;
pub mod validate;
