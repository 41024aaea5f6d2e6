pub mod export;
pub mod renderer;
pub mod table;
