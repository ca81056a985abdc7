pub mod classify;
pub mod labels;
pub mod search;
