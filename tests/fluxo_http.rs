//! Fluxo completo pelo router HTTP: envio, aprovação com Sienge, pagamento

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use grifo_titulos::config::Settings;
use grifo_titulos::models::{NovaEtapa, NovaObra, NovoUsuario, Obra, Papel};
use grifo_titulos::{build_router, AppState};

struct Ambiente {
    app: Router,
    state: Arc<AppState>,
    obra: Obra,
    admin: Uuid,
    equipe: Uuid,
}

async fn ambiente(sienge_url: Option<String>) -> Ambiente {
    let mut settings = Settings::default();
    settings.integracoes.sienge_lancamento_url = sienge_url;
    settings.admin.api_key = Some("chave-teste".to_string());
    settings.armazenamento.diretorio = std::env::temp_dir()
        .join(format!("grifo-http-{}", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let state = Arc::new(AppState::new(settings).unwrap());

    let obra = state
        .db
        .inserir_obra(NovaObra {
            nome: "Residencial Grifo".into(),
            codigo: "OB-01".into(),
            endereco: String::new(),
            grupo_id: None,
            permite_sem_apropriacao: false,
            ocultar_codigo_obra: false,
        })
        .await
        .unwrap();
    state
        .db
        .inserir_etapa(
            obra.id,
            NovaEtapa {
                codigo: "01".into(),
                nome: "Fundação".into(),
            },
        )
        .await
        .unwrap();

    let mut ids = Vec::new();
    for (email, papel, obras) in [
        ("admin@grifo.com", Papel::Admin, vec![]),
        ("equipe@grifo.com", Papel::Obra, vec![obra.id]),
    ] {
        let usuario = state
            .db
            .inserir_usuario(
                Uuid::new_v4(),
                NovoUsuario {
                    email: email.into(),
                    nome: email.into(),
                    telefone: None,
                    papel,
                    obra_ids: obras,
                    empresa_id: None,
                },
            )
            .await
            .unwrap();
        ids.push(usuario.perfil.id);
    }

    Ambiente {
        app: build_router(state.clone()),
        state,
        obra,
        admin: ids[0],
        equipe: ids[1],
    }
}

async fn chamar(
    app: &Router,
    metodo: &str,
    uri: &str,
    usuario: Option<Uuid>,
    corpo: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(metodo).uri(uri);
    if let Some(id) = usuario {
        req = req.header("X-User-Id", id.to_string());
    }
    let req = match corpo {
        Some(corpo) => req
            .header("content-type", "application/json")
            .body(Body::from(corpo.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resposta = app.clone().oneshot(req).await.unwrap();
    let status = resposta.status();
    let bytes = axum::body::to_bytes(resposta.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// PDF em base64 com `tamanho` bytes
fn pdf_base64(tamanho: usize) -> Value {
    let mut conteudo = b"%PDF-1.4\n".to_vec();
    conteudo.resize(tamanho, b'0');
    json!({
        "content_type": "application/pdf",
        "conteudo_base64": STANDARD.encode(conteudo),
        "prefixo": "doc"
    })
}

fn novo_titulo(obra_id: Uuid) -> Value {
    json!({
        "empresa": "1",
        "credor": "Concreto Forte Ltda",
        "credor_id": 10,
        "documento_tipo": "cnpj",
        "documento_numero": "12.345.678/0001-90",
        "obra_id": obra_id,
        "centro_custo": "CC-1",
        "codigo_etapa": "01",
        "valor_total": 1500.0,
        "tipo_documento": "NF",
        "numero_documento": "NF-77",
        "data_emissao": "2024-03-01",
        "data_vencimento": "2024-03-20",
        "plano_financeiro": "materiais_aplicados",
        "dados_bancarios": "PIX 12345678000190",
        "rateio_financeiro": [{ "centro_custo_id": "CC-1", "percentual": 100.0 }],
        "aprop_obra": [{ "etapa": "01 - Fundação", "percentual": 100.0 }]
    })
}

#[tokio::test]
async fn test_envio_aprovacao_e_pagamento() {
    let server = MockServer::start_async().await;
    let sienge = server
        .mock_async(|when, then| {
            when.method(POST).path("/sienge");
            then.status(200).json_body(json!({ "id": 4321 }));
        })
        .await;

    let amb = ambiente(Some(server.url("/sienge"))).await;

    let (status, corpo) = chamar(&amb.app, "POST", "/titulos", Some(amb.equipe), Some(novo_titulo(amb.obra.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo["titulo"]["status"], "enviado");
    assert_eq!(corpo["titulo"]["etapa"], "01 - Fundação");
    let id = corpo["titulo"]["id"].as_str().unwrap().to_string();

    let (status, corpo) = chamar(&amb.app, "GET", "/titulos/pendentes?busca=1.500,00", Some(amb.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo["total"], 1);
    assert_eq!(corpo["titulos"][0]["obra_nome"], "Residencial Grifo");

    // Equipe de obra não aprova: 403 sem corpo
    let (status, corpo) = chamar(&amb.app, "POST", &format!("/titulos/{}/aprovar", id), Some(amb.equipe), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(corpo, Value::Null);

    let (status, corpo) = chamar(&amb.app, "POST", &format!("/titulos/{}/aprovar", id), Some(amb.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo["titulo"]["status"], "aprovado");
    assert_eq!(corpo["titulo"]["id_sienge"], 4321);
    sienge.assert_async().await;

    let (status, corpo) = chamar(
        &amb.app,
        "POST",
        &format!("/titulos/{}/pagar", id),
        Some(amb.admin),
        Some(json!({ "obs": "PIX enviado" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo["titulo"]["status"], "pago");

    let (_, pendentes) = chamar(&amb.app, "GET", "/titulos/pendentes", Some(amb.admin), None).await;
    assert_eq!(pendentes["total"], 0);
    let (_, finalizados) = chamar(&amb.app, "GET", "/titulos/finalizados", Some(amb.admin), None).await;
    assert_eq!(finalizados["total"], 1);
    assert_eq!(finalizados["titulos"][0]["obs"], "PIX enviado");

    // Pagar de novo: não está mais entre os pendentes
    let (status, _) = chamar(&amb.app, "POST", &format!("/titulos/{}/pagar", id), Some(amb.admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (pendentes, finalizados) = amb.state.db.contar_titulos().await;
    assert_eq!((pendentes, finalizados), (0, 1));
}

#[tokio::test]
async fn test_falha_no_sienge_nao_altera_titulo() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/sienge");
            then.status(500).json_body(json!({ "message": "credor inexistente" }));
        })
        .await;

    let amb = ambiente(Some(server.url("/sienge"))).await;
    let (_, corpo) = chamar(&amb.app, "POST", "/titulos", Some(amb.equipe), Some(novo_titulo(amb.obra.id))).await;
    let id = corpo["titulo"]["id"].as_str().unwrap().to_string();

    let (status, corpo) = chamar(&amb.app, "POST", &format!("/titulos/{}/aprovar", id), Some(amb.admin), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(corpo["error"].as_str().unwrap().contains("credor inexistente"));

    let (_, corpo) = chamar(&amb.app, "GET", &format!("/titulos/{}", id), Some(amb.admin), None).await;
    assert_eq!(corpo["titulo"]["status"], "enviado");
}

#[tokio::test]
async fn test_sessao_e_rotas_publicas() {
    let amb = ambiente(None).await;

    let (status, corpo) = chamar(&amb.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo["status"], "healthy");

    let (status, _) = chamar(&amb.app, "GET", "/titulos", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = chamar(&amb.app, "GET", "/titulos", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, corpo) = chamar(&amb.app, "GET", "/perfil", Some(amb.equipe), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo["papel"], "obra");
    assert_eq!(corpo["capacidades"]["aprovar_titulos"], false);

    let (status, _) = chamar(&amb.app, "GET", "/titulos/status/cancelado", Some(amb.admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sincronizacao_de_credores_exige_chave() {
    let amb = ambiente(None).await;
    let credores = json!([
        { "creditor_id": 1, "nome": "Construtora São João", "doc": "11.222.333/0001-44", "tipo": "J" },
        { "creditor_id": 2, "nome": "Areia & Cia", "tipo": "J" }
    ]);

    let req = Request::builder()
        .method("POST")
        .uri("/admin/credores/sync")
        .header("content-type", "application/json")
        .body(Body::from(credores.to_string()))
        .unwrap();
    let resposta = amb.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resposta.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("POST")
        .uri("/admin/credores/sync")
        .header("content-type", "application/json")
        .header("X-Admin-Key", "chave-teste")
        .body(Body::from(credores.to_string()))
        .unwrap();
    let resposta = amb.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resposta.status(), StatusCode::OK);

    let (status, corpo) = chamar(&amb.app, "GET", "/credores?q=sao%20joao", Some(amb.equipe), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo["count"], 1);
    assert_eq!(corpo["credores"][0]["creditor_id"], 1);
}

#[tokio::test]
async fn test_upload_acima_do_limite_padrao_do_axum() {
    let amb = ambiente(None).await;

    let (status, corpo) = chamar(&amb.app, "POST", "/anexos", Some(amb.admin), Some(pdf_base64(3 * 1024 * 1024))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo["status"], "success");
    let caminho = corpo["arquivo"]["caminho"].as_str().unwrap().to_string();

    let (status, _) = chamar(&amb.app, "GET", &format!("/arquivos/{}", caminho), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, corpo) = chamar(&amb.app, "POST", "/titulos", Some(amb.equipe), Some(novo_titulo(amb.obra.id))).await;
    let id = corpo["titulo"]["id"].as_str().unwrap().to_string();
    let (status, corpo) = chamar(
        &amb.app,
        "POST",
        &format!("/titulos/{}/comprovante", id),
        Some(amb.admin),
        Some(pdf_base64(3 * 1024 * 1024)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo["message"], "Comprovante enviado com sucesso!");
}

#[tokio::test]
async fn test_upload_acima_de_10mb_recebe_mensagem_de_validacao() {
    let amb = ambiente(None).await;

    let (status, corpo) = chamar(&amb.app, "POST", "/anexos", Some(amb.admin), Some(pdf_base64(11 * 1024 * 1024))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(corpo["error"], "Arquivo muito grande. Máximo 10MB.");
}
