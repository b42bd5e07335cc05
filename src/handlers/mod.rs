pub mod anexos;
pub mod credores;
pub mod health;
pub mod obras;
pub mod realtime;
pub mod titulos;
pub mod usuarios;

pub use health::*;
