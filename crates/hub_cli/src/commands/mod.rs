pub mod collection;
pub mod status;
