pub mod object;
pub mod poll;
