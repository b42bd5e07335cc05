//! Filtros e paginação aplicados sobre a lista já carregada

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Titulo, TituloStatus};
use crate::utils::formatacao::formatar_valor_brl;
use crate::utils::normalization::normalize_busca;

pub const POR_PAGINA_PADRAO: usize = 50;
pub const POR_PAGINA_MAX: usize = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltroTitulos {
    /// Texto livre: credor, número do documento, obra ou valor ("1.500,00")
    pub busca: Option<String>,
    pub status: Option<TituloStatus>,
    pub obra_id: Option<Uuid>,
    /// Vencimento a partir de (inclusivo)
    pub vencimento_de: Option<NaiveDate>,
    /// Vencimento até (inclusivo)
    pub vencimento_ate: Option<NaiveDate>,
    /// Trecho do número do documento (ex.: série da nota)
    pub numero: Option<String>,
    /// `true`: só com documento anexado; `false`: só sem
    pub com_documento: Option<bool>,
    pub pagina: Option<usize>,
    pub por_pagina: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagina<T> {
    pub itens: Vec<T>,
    pub total: usize,
    pub pagina: usize,
    pub por_pagina: usize,
    pub total_paginas: usize,
}

impl FiltroTitulos {
    pub fn aceita(&self, titulo: &Titulo) -> bool {
        if let Some(status) = self.status {
            if titulo.status != status {
                return false;
            }
        }
        if let Some(obra_id) = self.obra_id {
            if titulo.obra_id != obra_id {
                return false;
            }
        }
        if self.vencimento_de.is_some_and(|de| titulo.data_vencimento < de) {
            return false;
        }
        if self.vencimento_ate.is_some_and(|ate| titulo.data_vencimento > ate) {
            return false;
        }
        if let Some(numero) = self.numero.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            if !titulo.numero_documento.to_lowercase().contains(&numero.to_lowercase()) {
                return false;
            }
        }
        if let Some(com_documento) = self.com_documento {
            let tem = titulo.documento_url.as_deref().is_some_and(|u| !u.is_empty());
            if tem != com_documento {
                return false;
            }
        }
        match self.busca.as_deref().map(normalize_busca).filter(|b| !b.is_empty()) {
            Some(termo) => busca_livre(titulo, &termo),
            None => true,
        }
    }

    pub fn aplicar(&self, titulos: Vec<Titulo>) -> Pagina<Titulo> {
        let filtrados: Vec<Titulo> = titulos.into_iter().filter(|t| self.aceita(t)).collect();
        paginar(filtrados, self.pagina, self.por_pagina)
    }
}

fn busca_livre(titulo: &Titulo, termo: &str) -> bool {
    let valor = formatar_valor_brl(titulo.valor_total);
    [
        Some(titulo.credor.as_str()),
        Some(titulo.numero_documento.as_str()),
        titulo.obra_nome.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|campo| normalize_busca(campo).contains(termo))
        || valor.contains(termo)
        || normalize_busca(&valor).contains(termo)
}

pub fn paginar<T>(itens: Vec<T>, pagina: Option<usize>, por_pagina: Option<usize>) -> Pagina<T> {
    let por_pagina = por_pagina.unwrap_or(POR_PAGINA_PADRAO).clamp(1, POR_PAGINA_MAX);
    let pagina = pagina.unwrap_or(1).max(1);
    let total = itens.len();

    let itens = itens
        .into_iter()
        .skip((pagina - 1) * por_pagina)
        .take(por_pagina)
        .collect();

    Pagina {
        itens,
        total,
        pagina,
        por_pagina,
        total_paginas: total.div_ceil(por_pagina),
    }
}
