use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Status do ciclo de vida de um título
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TituloStatus {
    Enviado,
    Aprovado,
    Reprovado,
    Pago,
    ProcessandoPagamento,
}

/// Coleção física onde o título está armazenado
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Colecao {
    /// `titulos_pendentes`: enviado, aprovado, reprovado
    Pendentes,
    /// `titulos`: pago, processando_pagamento
    Finalizados,
}

impl Colecao {
    pub fn tabela(&self) -> &'static str {
        match self {
            Colecao::Pendentes => "titulos_pendentes",
            Colecao::Finalizados => "titulos",
        }
    }
}

impl TituloStatus {
    pub const TODOS: [TituloStatus; 5] = [
        TituloStatus::Enviado,
        TituloStatus::Aprovado,
        TituloStatus::Reprovado,
        TituloStatus::Pago,
        TituloStatus::ProcessandoPagamento,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TituloStatus::Enviado => "enviado",
            TituloStatus::Aprovado => "aprovado",
            TituloStatus::Reprovado => "reprovado",
            TituloStatus::Pago => "pago",
            TituloStatus::ProcessandoPagamento => "processando_pagamento",
        }
    }

    pub fn parse(valor: &str) -> Option<Self> {
        Self::TODOS.into_iter().find(|s| s.as_str() == valor)
    }

    pub fn colecao(&self) -> Colecao {
        match self {
            TituloStatus::Enviado | TituloStatus::Aprovado | TituloStatus::Reprovado => Colecao::Pendentes,
            TituloStatus::Pago | TituloStatus::ProcessandoPagamento => Colecao::Finalizados,
        }
    }

    /// Tabela de transições válidas.
    ///
    /// Reaprovar um título aprovado (ou reprovar um reprovado) é aceito e
    /// apenas regrava os carimbos: aprovações concorrentes não falham, vence
    /// a última escrita.
    pub fn pode_transicionar_para(&self, destino: TituloStatus) -> bool {
        use TituloStatus::*;
        matches!(
            (self, destino),
            (Enviado, Aprovado)
                | (Aprovado, Aprovado)
                | (Enviado, Reprovado)
                | (Reprovado, Reprovado)
                | (Aprovado, Pago)
                | (ProcessandoPagamento, Pago)
                | (Aprovado, ProcessandoPagamento)
                | (Reprovado, Enviado)
        )
    }

    /// Mensagem exibida após a transição
    pub fn mensagem_sucesso(&self) -> &'static str {
        match self {
            TituloStatus::Enviado => "Título reenviado.",
            TituloStatus::Aprovado => "Título aprovado e lançado no Sienge.",
            TituloStatus::Reprovado => "Título reprovado.",
            TituloStatus::Pago => "Pagamento registrado.",
            TituloStatus::ProcessandoPagamento => "Pagamento em processamento.",
        }
    }
}

impl fmt::Display for TituloStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentoTipo {
    Cpf,
    Cnpj,
}

impl DocumentoTipo {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentoTipo::Cpf => "cpf",
            DocumentoTipo::Cnpj => "cnpj",
        }
    }
}

/// Tipo do documento fiscal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TipoDocumentoFiscal {
    /// Nota fiscal
    #[serde(rename = "NF")]
    NotaFiscal,
    #[serde(rename = "BOL")]
    Boleto,
    #[serde(rename = "REC")]
    Recibo,
    /// Documento provisório
    #[serde(rename = "PRV")]
    Provisorio,
    #[serde(rename = "FAT")]
    Fatura,
    #[serde(rename = "OUT")]
    Outros,
}

impl TipoDocumentoFiscal {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoDocumentoFiscal::NotaFiscal => "NF",
            TipoDocumentoFiscal::Boleto => "BOL",
            TipoDocumentoFiscal::Recibo => "REC",
            TipoDocumentoFiscal::Provisorio => "PRV",
            TipoDocumentoFiscal::Fatura => "FAT",
            TipoDocumentoFiscal::Outros => "OUT",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanoFinanceiro {
    ServicosTerceiros,
    MateriaisAplicados,
}

impl PlanoFinanceiro {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanoFinanceiro::ServicosTerceiros => "servicos_terceiros",
            PlanoFinanceiro::MateriaisAplicados => "materiais_aplicados",
        }
    }
}

/// Forma como o pagamento será lido
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TipoLeituraPagamento {
    #[default]
    Manual,
    Boleto,
    Qrcode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateioFinanceiroItem {
    pub centro_custo_id: String,
    pub percentual: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApropObraItem {
    pub etapa: String,
    pub percentual: f64,
}

/// Título financeiro (documento a pagar)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Titulo {
    pub id: Uuid,
    pub empresa: String,
    pub empresa_id: Option<Uuid>,
    pub credor: String,
    /// `None` quando o credor foi digitado manualmente
    pub credor_id: Option<i64>,
    pub documento_tipo: DocumentoTipo,
    pub documento_numero: String,
    pub obra_id: Uuid,
    pub obra_codigo: String,
    /// Preenchido na leitura, a partir de `obras`
    #[serde(default)]
    pub obra_nome: Option<String>,
    pub grupo_id: Option<String>,
    pub centro_custo: String,
    pub etapa: String,
    pub codigo_etapa: Option<String>,
    pub valor_total: f64,
    pub descontos: f64,
    pub parcelas: u32,
    pub tipo_documento: TipoDocumentoFiscal,
    pub numero_documento: String,
    pub data_emissao: NaiveDate,
    pub data_vencimento: NaiveDate,
    pub plano_financeiro: PlanoFinanceiro,
    pub dados_bancarios: Option<String>,
    pub tipo_leitura_pagamento: TipoLeituraPagamento,
    pub documento_url: Option<String>,
    pub arquivo_pagamento_url: Option<String>,
    pub descricao: Option<String>,
    pub rateio_financeiro: Vec<RateioFinanceiroItem>,
    pub aprop_obra: Vec<ApropObraItem>,
    pub status: TituloStatus,
    pub created_by: Uuid,
    pub criador: String,
    pub aprovado_por: Option<Uuid>,
    pub aprovado_em: Option<DateTime<Utc>>,
    pub pago_por: Option<Uuid>,
    pub pago_em: Option<DateTime<Utc>>,
    pub motivo_reprovacao: Option<String>,
    pub obs: Option<String>,
    pub id_sienge: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Titulo {
    pub fn to_lancamento_sienge(&self) -> integracoes::sienge::LancamentoTitulo {
        integracoes::sienge::LancamentoTitulo {
            id: self.id.to_string(),
            empresa: self.empresa.clone(),
            credor: self.credor.clone(),
            credor_id: self.credor_id,
            documento_tipo: self.documento_tipo.as_str().to_string(),
            documento_numero: self.documento_numero.clone(),
            obra_codigo: self.obra_codigo.clone(),
            centro_custo: self.centro_custo.clone(),
            etapa: self.etapa.clone(),
            codigo_etapa: self.codigo_etapa.clone(),
            valor_total: self.valor_total,
            descontos: self.descontos,
            parcelas: self.parcelas,
            tipo_documento: self.tipo_documento.as_str().to_string(),
            numero_documento: self.numero_documento.clone(),
            data_emissao: self.data_emissao,
            data_vencimento: self.data_vencimento,
            plano_financeiro: self.plano_financeiro.as_str().to_string(),
            dados_bancarios: self.dados_bancarios.clone(),
            documento_url: self.documento_url.clone(),
            descricao: self.descricao.clone(),
            rateio_financeiro: serde_json::to_value(&self.rateio_financeiro).unwrap_or_default(),
            aprop_obra: serde_json::to_value(&self.aprop_obra).unwrap_or_default(),
        }
    }

    pub fn to_ordem_pagamento(&self) -> integracoes::asaas::OrdemPagamento {
        integracoes::asaas::OrdemPagamento {
            id: self.id.to_string(),
            id_sienge: self.id_sienge,
            valor_total: self.valor_total,
            dados_bancarios: self.dados_bancarios.clone(),
            credor: self.credor.clone(),
            obra_codigo: self.obra_codigo.clone(),
            descricao: self.descricao.clone(),
        }
    }
}

/// Dados de submissão de um novo título
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovoTitulo {
    pub empresa: String,
    pub credor: String,
    #[serde(default)]
    pub credor_id: Option<i64>,
    pub documento_tipo: DocumentoTipo,
    pub documento_numero: String,
    pub obra_id: Uuid,
    #[serde(default)]
    pub centro_custo: String,
    #[serde(default)]
    pub codigo_etapa: Option<String>,
    pub valor_total: f64,
    #[serde(default)]
    pub descontos: f64,
    #[serde(default = "uma_parcela")]
    pub parcelas: u32,
    pub tipo_documento: TipoDocumentoFiscal,
    pub numero_documento: String,
    pub data_emissao: NaiveDate,
    pub data_vencimento: NaiveDate,
    pub plano_financeiro: PlanoFinanceiro,
    #[serde(default)]
    pub dados_bancarios: Option<String>,
    #[serde(default)]
    pub tipo_leitura_pagamento: TipoLeituraPagamento,
    #[serde(default)]
    pub documento_url: Option<String>,
    #[serde(default)]
    pub arquivo_pagamento_url: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub rateio_financeiro: Vec<RateioFinanceiroItem>,
    #[serde(default)]
    pub aprop_obra: Vec<ApropObraItem>,
}

fn uma_parcela() -> u32 {
    1
}

impl NovoTitulo {
    /// Monta um novo envio a partir de um título existente (replicação)
    pub fn replicado_de(origem: &Titulo) -> Self {
        Self {
            empresa: origem.empresa.clone(),
            credor: origem.credor.clone(),
            credor_id: origem.credor_id,
            documento_tipo: origem.documento_tipo,
            documento_numero: origem.documento_numero.clone(),
            obra_id: origem.obra_id,
            centro_custo: origem.centro_custo.clone(),
            codigo_etapa: origem.codigo_etapa.clone(),
            valor_total: origem.valor_total,
            descontos: origem.descontos,
            parcelas: origem.parcelas,
            tipo_documento: origem.tipo_documento,
            numero_documento: origem.numero_documento.clone(),
            data_emissao: origem.data_emissao,
            data_vencimento: origem.data_vencimento,
            plano_financeiro: origem.plano_financeiro,
            dados_bancarios: origem.dados_bancarios.clone(),
            tipo_leitura_pagamento: origem.tipo_leitura_pagamento,
            documento_url: origem.documento_url.clone(),
            arquivo_pagamento_url: origem.arquivo_pagamento_url.clone(),
            descricao: origem.descricao.clone(),
            rateio_financeiro: origem.rateio_financeiro.clone(),
            aprop_obra: origem.aprop_obra.clone(),
        }
    }
}

/// Indicadores do dashboard
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DashboardStats {
    pub total: usize,
    pub enviados: usize,
    pub aprovados: usize,
    pub reprovados: usize,
    pub pagos: usize,
    pub processando: usize,
    pub valor_total: f64,
    pub valor_pendente: f64,
    pub valor_pago: f64,
}

impl DashboardStats {
    pub fn calcular(titulos: &[Titulo]) -> Self {
        titulos.iter().fold(Self::default(), |mut acc, t| {
            acc.total += 1;
            acc.valor_total += t.valor_total;
            match t.status {
                TituloStatus::Enviado => {
                    acc.enviados += 1;
                    acc.valor_pendente += t.valor_total;
                }
                TituloStatus::Aprovado => {
                    acc.aprovados += 1;
                    acc.valor_pendente += t.valor_total;
                }
                TituloStatus::Reprovado => acc.reprovados += 1,
                TituloStatus::Pago => {
                    acc.pagos += 1;
                    acc.valor_pago += t.valor_total;
                }
                TituloStatus::ProcessandoPagamento => acc.processando += 1,
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colecao_por_status() {
        assert_eq!(TituloStatus::Enviado.colecao(), Colecao::Pendentes);
        assert_eq!(TituloStatus::Aprovado.colecao(), Colecao::Pendentes);
        assert_eq!(TituloStatus::Reprovado.colecao(), Colecao::Pendentes);
        assert_eq!(TituloStatus::Pago.colecao(), Colecao::Finalizados);
        assert_eq!(TituloStatus::ProcessandoPagamento.colecao(), Colecao::Finalizados);
        assert_eq!(Colecao::Finalizados.tabela(), "titulos");
    }

    #[test]
    fn test_transicoes_validas() {
        use TituloStatus::*;
        assert!(Enviado.pode_transicionar_para(Aprovado));
        assert!(Enviado.pode_transicionar_para(Reprovado));
        assert!(Aprovado.pode_transicionar_para(Pago));
        assert!(Aprovado.pode_transicionar_para(ProcessandoPagamento));
        assert!(Reprovado.pode_transicionar_para(Enviado));
        assert!(Aprovado.pode_transicionar_para(Aprovado));

        assert!(!Enviado.pode_transicionar_para(Pago));
        assert!(!Reprovado.pode_transicionar_para(Aprovado));
        assert!(!Pago.pode_transicionar_para(Enviado));
        assert!(!Pago.pode_transicionar_para(Pago));
        assert!(!Aprovado.pode_transicionar_para(Reprovado));
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&TituloStatus::ProcessandoPagamento).unwrap(),
            "\"processando_pagamento\""
        );
        assert_eq!(TituloStatus::parse("reprovado"), Some(TituloStatus::Reprovado));
        assert_eq!(TituloStatus::parse("cancelado"), None);
        assert_eq!(
            serde_json::to_string(&TipoDocumentoFiscal::Provisorio).unwrap(),
            "\"PRV\""
        );
    }
}
