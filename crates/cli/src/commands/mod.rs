pub mod poll;
pub mod run;
