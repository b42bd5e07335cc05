pub mod credor;
pub mod eventos;
pub mod obra;
pub mod perfil;
pub mod titulo;

pub use credor::Credor;
pub use eventos::{ChangeEvent, Tabela, TipoEvento};
pub use obra::{AtualizacaoObra, NovaEtapa, NovaObra, Obra, ObraEtapa};
pub use perfil::{Capacidades, ConclusaoPerfil, NovoUsuario, Papel, Perfil, Sessao, Usuario};
pub use titulo::{
    ApropObraItem, Colecao, DashboardStats, DocumentoTipo, NovoTitulo, PlanoFinanceiro,
    RateioFinanceiroItem, TipoDocumentoFiscal, TipoLeituraPagamento, Titulo, TituloStatus,
};
