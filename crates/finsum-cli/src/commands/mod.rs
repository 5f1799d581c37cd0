pub mod history;
pub mod run;
pub mod seed;
pub mod status;
