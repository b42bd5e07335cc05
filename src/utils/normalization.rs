//! Normalização de texto para busca de credores
//!
//! Compara nomes ignorando acentos, caixa e pontuação, e documentos
//! (CPF/CNPJ) apenas pelos dígitos.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Remove acentos, converte para lowercase, troca pontuação por espaço e
/// colapsa espaços, usando NFKD
///
/// # Exemplos
/// ```
/// use grifo_titulos::utils::normalization::normalize_busca;
///
/// assert_eq!(normalize_busca("José & Silva Ltda."), "jose silva ltda");
/// assert_eq!(normalize_busca("  CONCRETO-FORTE  "), "concreto forte");
/// ```
pub fn normalize_busca(input: &str) -> String {
    input
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Mantém apenas os dígitos ASCII (CPF/CNPJ sem máscara)
pub fn so_digitos(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Verifica se `termo` (já normalizado) aparece em `texto` após normalização
pub fn contem_normalizado(texto: &str, termo_normalizado: &str) -> bool {
    !termo_normalizado.is_empty() && normalize_busca(texto).contains(termo_normalizado)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_busca() {
        assert_eq!(normalize_busca("José"), "jose");
        assert_eq!(normalize_busca("AÇOS & FERRAGENS S/A"), "acos ferragens s a");
        assert_eq!(normalize_busca("Müller"), "muller");
        assert_eq!(normalize_busca("   "), "");
        assert_eq!(normalize_busca("João-Paulo"), "joao paulo");
    }

    #[test]
    fn test_so_digitos() {
        assert_eq!(so_digitos("12.345.678/0001-90"), "12345678000190");
        assert_eq!(so_digitos("abc"), "");
    }

    #[test]
    fn test_contem_normalizado() {
        assert!(contem_normalizado("Construtora São José", "sao jose"));
        assert!(!contem_normalizado("Construtora", ""));
        assert!(!contem_normalizado("Areia Fina", "cimento"));
    }
}
