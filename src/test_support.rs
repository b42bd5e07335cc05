//! Dados e cenários compartilhados pelos testes unitários

use chrono::{NaiveDate, Utc};
use integracoes::asaas::AsaasClient;
use integracoes::sienge::SiengeClient;
use integracoes::WebhookClient;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::models::*;
use crate::services::consulta_titulos::ConsultaTitulos;
use crate::services::fluxo_titulos::FluxoTitulos;
use crate::services::read_cache::ReadCache;
use crate::services::realtime::ChangeFeed;
use crate::store::Database;

pub fn titulo_exemplo(obra_id: Uuid) -> Titulo {
    let agora = Utc::now();
    Titulo {
        id: Uuid::new_v4(),
        empresa: "1".into(),
        empresa_id: None,
        credor: "Fornecedor Exemplo".into(),
        credor_id: Some(10),
        documento_tipo: DocumentoTipo::Cnpj,
        documento_numero: "12.345.678/0001-90".into(),
        obra_id,
        obra_codigo: "OB-01".into(),
        obra_nome: None,
        grupo_id: None,
        centro_custo: "CC-1".into(),
        etapa: "01 - Fundação".into(),
        codigo_etapa: Some("01".into()),
        valor_total: 250.0,
        descontos: 0.0,
        parcelas: 1,
        tipo_documento: TipoDocumentoFiscal::NotaFiscal,
        numero_documento: "NF-1".into(),
        data_emissao: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        data_vencimento: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
        plano_financeiro: PlanoFinanceiro::MateriaisAplicados,
        dados_bancarios: Some("PIX 12345678000190".into()),
        tipo_leitura_pagamento: TipoLeituraPagamento::Manual,
        documento_url: None,
        arquivo_pagamento_url: None,
        descricao: None,
        rateio_financeiro: vec![RateioFinanceiroItem {
            centro_custo_id: "CC-1".into(),
            percentual: 100.0,
        }],
        aprop_obra: vec![ApropObraItem {
            etapa: "01 - Fundação".into(),
            percentual: 100.0,
        }],
        status: TituloStatus::Enviado,
        created_by: Uuid::new_v4(),
        criador: "Equipe".into(),
        aprovado_por: None,
        aprovado_em: None,
        pago_por: None,
        pago_em: None,
        motivo_reprovacao: None,
        obs: None,
        id_sienge: None,
        created_at: agora,
        updated_at: agora,
    }
}

pub fn novo_titulo(obra_id: Uuid) -> NovoTitulo {
    NovoTitulo::replicado_de(&titulo_exemplo(obra_id))
}

pub fn nova_obra(codigo: &str, nome: &str) -> NovaObra {
    NovaObra {
        nome: nome.to_string(),
        codigo: codigo.to_string(),
        endereco: "Rua das Obras, 100".into(),
        grupo_id: None,
        permite_sem_apropriacao: false,
        ocultar_codigo_obra: false,
    }
}

/// Store com uma obra, uma etapa, um admin e um usuário de obra vinculado
pub struct Cenario {
    pub db: Arc<Database>,
    pub consulta: ConsultaTitulos,
    pub fluxo: FluxoTitulos,
    pub obra: Obra,
    pub admin: Sessao,
    pub equipe: Sessao,
}

impl Cenario {
    pub async fn novo(url_sienge: Option<String>, url_asaas: Option<String>) -> Self {
        Self::com_urls(url_sienge, None, url_asaas).await
    }

    pub async fn com_urls(
        url_lancamento: Option<String>,
        url_atualizacao: Option<String>,
        url_asaas: Option<String>,
    ) -> Self {
        let db = Arc::new(Database::new(ChangeFeed::new(64)));
        let consulta = ConsultaTitulos::new(db.clone(), ReadCache::new(Duration::from_secs(300)));
        let client = WebhookClient::new().unwrap();
        let fluxo = FluxoTitulos::new(
            db.clone(),
            consulta.clone(),
            SiengeClient::new(client.clone(), url_lancamento, url_atualizacao),
            AsaasClient::new(client, url_asaas),
        );

        let obra = db
            .inserir_obra(nova_obra("OB-01", "Residencial Grifo"))
            .await
            .unwrap();
        db.inserir_etapa(
            obra.id,
            NovaEtapa {
                codigo: "01".into(),
                nome: "Fundação".into(),
            },
        )
        .await
        .unwrap();

        let admin = criar_usuario(&db, "admin@grifo.com", Papel::Admin, vec![]).await;
        let equipe = criar_usuario(&db, "equipe@grifo.com", Papel::Obra, vec![obra.id]).await;

        Self {
            db,
            consulta,
            fluxo,
            obra,
            admin,
            equipe,
        }
    }

    pub async fn criar_obra(&self, codigo: &str) -> Obra {
        self.db
            .inserir_obra(nova_obra(codigo, &format!("Obra {}", codigo)))
            .await
            .unwrap()
    }

    pub async fn criar_admin(&self, email: &str) -> Sessao {
        criar_usuario(&self.db, email, Papel::Admin, vec![]).await
    }

    pub async fn titulo_enviado(&self) -> Titulo {
        self.fluxo
            .criar(&self.equipe, novo_titulo(self.obra.id))
            .await
            .unwrap()
    }
}

pub async fn criar_usuario(db: &Database, email: &str, papel: Papel, obra_ids: Vec<Uuid>) -> Sessao {
    let usuario = db
        .inserir_usuario(
            Uuid::new_v4(),
            NovoUsuario {
                email: email.to_string(),
                nome: email.split('@').next().unwrap_or(email).to_string(),
                telefone: None,
                papel,
                obra_ids,
                empresa_id: None,
            },
        )
        .await
        .unwrap();
    Sessao::new(usuario)
}
