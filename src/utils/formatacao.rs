/// Formata um valor em reais no padrão pt-BR, sem o símbolo ("1.500,00")
pub fn formatar_valor_brl(valor: f64) -> String {
    let centavos = (valor.abs() * 100.0).round() as u64;
    let inteiro = (centavos / 100).to_string();
    let fracao = centavos % 100;

    let mut agrupado = String::with_capacity(inteiro.len() + inteiro.len() / 3);
    for (i, c) in inteiro.chars().enumerate() {
        if i > 0 && (inteiro.len() - i) % 3 == 0 {
            agrupado.push('.');
        }
        agrupado.push(c);
    }

    let sinal = if valor < 0.0 && centavos > 0 { "-" } else { "" };
    format!("{}{},{:02}", sinal, agrupado, fracao)
}

/// Mesmo valor com o prefixo da moeda ("R$ 1.500,00")
pub fn formatar_moeda(valor: f64) -> String {
    format!("R$ {}", formatar_valor_brl(valor))
}
