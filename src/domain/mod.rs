pub mod letter;
pub mod pack;
pub mod puzzle;
