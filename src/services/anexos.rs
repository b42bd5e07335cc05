//! Armazenamento de anexos (documentos, boletos e comprovantes)
//!
//! Os arquivos ficam em `{diretorio}/{user_id}/{prefixo}_{uuid}.{ext}`; a URL
//! pública é montada sob demanda a partir do caminho relativo.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use integracoes::comprovantes::{ComprovanteNotifier, NotificacaoComprovante};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::models::{Sessao, Titulo};
use crate::utils::logging::log_validation_error;
use crate::utils::{AppError, AppResult};

const TIPOS_ACEITOS: [(&str, &str); 3] = [("application/pdf", "pdf"), ("image/jpeg", "jpg"), ("image/png", "png")];

/// Upload em JSON com o conteúdo em base64
#[derive(Debug, Clone, Deserialize)]
pub struct UploadArquivo {
    pub content_type: String,
    pub conteudo_base64: String,
    /// `doc`, `pagamento` ou `comprovante`
    #[serde(default)]
    pub prefixo: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArquivoSalvo {
    pub caminho: String,
    pub url_publica: String,
    pub tamanho: usize,
}

#[derive(Clone)]
pub struct AnexosService {
    diretorio: PathBuf,
    url_publica_base: String,
    max_bytes: usize,
    notifier: ComprovanteNotifier,
}

fn extensao_para(content_type: &str) -> Option<&'static str> {
    let tipo = content_type.split(';').next().unwrap_or_default().trim();
    TIPOS_ACEITOS
        .iter()
        .find(|(aceito, _)| aceito.eq_ignore_ascii_case(tipo))
        .map(|(_, ext)| *ext)
}

pub fn content_type_de(caminho: &str) -> &'static str {
    match caminho.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

fn prefixo_seguro(prefixo: Option<&str>) -> String {
    let limpo: String = prefixo
        .unwrap_or("doc")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if limpo.is_empty() {
        "doc".to_string()
    } else {
        limpo
    }
}

impl AnexosService {
    pub fn new(
        diretorio: impl Into<PathBuf>,
        url_publica_base: impl Into<String>,
        max_bytes: usize,
        notifier: ComprovanteNotifier,
    ) -> Self {
        Self {
            diretorio: diretorio.into(),
            url_publica_base: url_publica_base.into(),
            max_bytes,
            notifier,
        }
    }

    /// URL pública de um caminho relativo, com cada segmento codificado
    pub fn url_publica(&self, caminho: &str) -> String {
        let segmentos: Vec<String> = caminho
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/{}", self.url_publica_base.trim_end_matches('/'), segmentos.join("/"))
    }

    /// Resolve um caminho relativo dentro do diretório de anexos
    fn resolver(&self, caminho: &str) -> AppResult<PathBuf> {
        let relativo = Path::new(caminho);
        let seguro = !caminho.is_empty()
            && relativo
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !seguro {
            return Err(AppError::NotFound(format!("Arquivo não encontrado: {}", caminho)));
        }
        Ok(self.diretorio.join(relativo))
    }

    pub async fn salvar(&self, usuario_id: Uuid, upload: &UploadArquivo) -> AppResult<ArquivoSalvo> {
        let extensao = extensao_para(&upload.content_type).ok_or_else(|| {
            log_validation_error("content_type", &upload.content_type);
            AppError::ValidationError("Formato não suportado. Use PDF, JPEG ou PNG.".to_string())
        })?;

        let conteudo = STANDARD
            .decode(upload.conteudo_base64.trim())
            .map_err(|_| AppError::ValidationError("Conteúdo do arquivo inválido".to_string()))?;
        if conteudo.len() > self.max_bytes {
            log_validation_error("arquivo", "tamanho acima do limite");
            return Err(AppError::ValidationError("Arquivo muito grande. Máximo 10MB.".to_string()));
        }

        let caminho = format!(
            "{}/{}_{}.{}",
            usuario_id,
            prefixo_seguro(upload.prefixo.as_deref()),
            Uuid::new_v4(),
            extensao
        );
        let destino = self.resolver(&caminho)?;
        if let Some(pasta) = destino.parent() {
            tokio::fs::create_dir_all(pasta)
                .await
                .map_err(|e| AppError::InternalError(format!("Erro ao criar pasta de anexos: {}", e)))?;
        }
        tokio::fs::write(&destino, &conteudo)
            .await
            .map_err(|e| AppError::InternalError(format!("Erro ao enviar documento: {}", e)))?;

        info!("📎 Anexo salvo: {} ({} bytes)", caminho, conteudo.len());
        Ok(ArquivoSalvo {
            url_publica: self.url_publica(&caminho),
            tamanho: conteudo.len(),
            caminho,
        })
    }

    pub async fn ler(&self, caminho: &str) -> AppResult<(Vec<u8>, &'static str)> {
        let origem = self.resolver(caminho)?;
        let conteudo = tokio::fs::read(&origem)
            .await
            .map_err(|_| AppError::NotFound(format!("Arquivo não encontrado: {}", caminho)))?;
        Ok((conteudo, content_type_de(caminho)))
    }

    /// Salva o comprovante de pagamento e avisa a importação em background
    pub async fn enviar_comprovante(
        &self,
        sessao: &Sessao,
        titulo: &Titulo,
        upload: &UploadArquivo,
    ) -> AppResult<ArquivoSalvo> {
        if !sessao.capacidades.pagar_titulos {
            return Err(AppError::Forbidden);
        }

        let upload = UploadArquivo {
            prefixo: Some("comprovante".to_string()),
            ..upload.clone()
        };
        let salvo = self.salvar(sessao.id(), &upload).await?;

        self.notifier.notificar_em_background(NotificacaoComprovante {
            titulo_id: titulo.id.to_string(),
            caminho: salvo.caminho.clone(),
            url_publica: salvo.url_publica.clone(),
            enviado_por: sessao.id().to_string(),
            enviado_em: Utc::now(),
        });
        Ok(salvo)
    }
}
