pub mod color;
pub mod track;
