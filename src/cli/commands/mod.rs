pub mod fix;
pub mod history;
