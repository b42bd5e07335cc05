pub mod error;
pub mod formatacao;
pub mod logging;
pub mod normalization;

pub use error::*;
pub use formatacao::{formatar_moeda, formatar_valor_brl};
