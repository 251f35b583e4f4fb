pub mod components;
pub mod console;
pub mod dto;
