//! Validação de rateio (centro de custo) e apropriação por etapa

use crate::models::{ApropObraItem, Obra, RateioFinanceiroItem};
use crate::utils::logging::log_validation_error;
use crate::utils::{AppError, AppResult};

const TOLERANCIA: f64 = 0.01;

fn validar_percentuais<'a>(
    nome: &str,
    itens: impl Iterator<Item = (&'a str, f64)>,
    chave_vazia: &str,
) -> AppResult<()> {
    let mut soma = 0.0;
    let mut quantidade = 0;

    for (chave, percentual) in itens {
        if chave.trim().is_empty() {
            log_validation_error(nome, chave_vazia);
            return Err(AppError::ValidationError(chave_vazia.to_string()));
        }
        soma += percentual;
        quantidade += 1;
    }

    if quantidade == 0 {
        let mensagem = format!("Informe ao menos um item de {}", nome);
        log_validation_error(nome, &mensagem);
        return Err(AppError::ValidationError(mensagem));
    }

    if (soma - 100.0).abs() > TOLERANCIA {
        let mensagem = format!("A soma do {} deve ser 100%. Atual: {:.1}%", nome, soma);
        log_validation_error(nome, &mensagem);
        return Err(AppError::ValidationError(mensagem));
    }

    Ok(())
}

/// Lista não vazia, centros de custo preenchidos e soma 100% (±0.01)
pub fn validar_rateio_financeiro(itens: &[RateioFinanceiroItem]) -> AppResult<()> {
    validar_percentuais(
        "rateio financeiro",
        itens.iter().map(|i| (i.centro_custo_id.as_str(), i.percentual)),
        "Selecione o centro de custo em todos os itens do rateio",
    )
}

/// Lista não vazia, etapas preenchidas e soma 100% (±0.01)
pub fn validar_apropriacao_obra(itens: &[ApropObraItem]) -> AppResult<()> {
    validar_percentuais(
        "rateio de apropriação",
        itens.iter().map(|i| (i.etapa.as_str(), i.percentual)),
        "Selecione a etapa em todos os itens da apropriação",
    )
}

/// Aplica as duas validações conforme as políticas da obra
///
/// Listas preenchidas são sempre validadas; listas vazias só passam quando a
/// obra dispensa o respectivo rateio.
pub fn validar_rateios(
    obra: &Obra,
    rateio_financeiro: &[RateioFinanceiroItem],
    aprop_obra: &[ApropObraItem],
) -> AppResult<()> {
    if !rateio_financeiro.is_empty() || obra.exige_rateio_financeiro() {
        validar_rateio_financeiro(rateio_financeiro)?;
    }

    if !aprop_obra.is_empty() || obra.exige_apropriacao_etapas() {
        validar_apropriacao_obra(aprop_obra)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn rateio(percentuais: &[f64]) -> Vec<RateioFinanceiroItem> {
        percentuais
            .iter()
            .enumerate()
            .map(|(i, p)| RateioFinanceiroItem {
                centro_custo_id: format!("CC-{}", i),
                percentual: *p,
            })
            .collect()
    }

    fn obra(permite_sem_apropriacao: bool, ocultar_codigo_obra: bool) -> Obra {
        Obra {
            id: Uuid::new_v4(),
            nome: "Residencial Grifo".into(),
            codigo: "RG-01".into(),
            endereco: String::new(),
            ativa: true,
            grupo_id: None,
            permite_sem_apropriacao,
            ocultar_codigo_obra,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_soma_cem_passa() {
        assert!(validar_rateio_financeiro(&rateio(&[40.0, 35.0, 25.0])).is_ok());
        assert!(validar_rateio_financeiro(&rateio(&[33.33, 33.33, 33.34])).is_ok());
        assert!(validar_rateio_financeiro(&rateio(&[99.995])).is_ok());
    }

    #[test]
    fn test_soma_diferente_informa_atual() {
        let err = validar_rateio_financeiro(&rateio(&[40.0, 35.0, 24.0])).unwrap_err();
        assert!(err.to_string().ends_with("Atual: 99.0%"), "{}", err);

        let err = validar_apropriacao_obra(&[ApropObraItem {
            etapa: "01 - Fundação".into(),
            percentual: 100.5,
        }])
        .unwrap_err();
        assert!(err.to_string().contains("Atual: 100.5%"));
    }

    #[test]
    fn test_chave_vazia_e_lista_vazia() {
        let mut itens = rateio(&[50.0, 50.0]);
        itens[1].centro_custo_id = "  ".into();
        assert!(validar_rateio_financeiro(&itens).is_err());
        assert!(validar_rateio_financeiro(&[]).is_err());
        assert!(validar_apropriacao_obra(&[]).is_err());
    }

    #[test]
    fn test_politicas_da_obra() {
        let cem = rateio(&[100.0]);
        let etapa = vec![ApropObraItem {
            etapa: "01".into(),
            percentual: 100.0,
        }];

        // Obra comum exige as duas listas
        assert!(validar_rateios(&obra(false, false), &[], &etapa).is_err());
        assert!(validar_rateios(&obra(false, false), &cem, &[]).is_err());
        assert!(validar_rateios(&obra(false, false), &cem, &etapa).is_ok());

        // Sem apropriação: rateio financeiro dispensado, etapas não
        assert!(validar_rateios(&obra(true, false), &[], &etapa).is_ok());
        assert!(validar_rateios(&obra(true, false), &[], &[]).is_err());

        // Código oculto dispensa as duas, mas o que foi informado é validado
        assert!(validar_rateios(&obra(false, true), &[], &[]).is_ok());
        assert!(validar_rateios(&obra(false, true), &rateio(&[50.0]), &[]).is_err());
    }
}
