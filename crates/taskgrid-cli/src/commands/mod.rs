pub mod run;
pub mod scaffold;
