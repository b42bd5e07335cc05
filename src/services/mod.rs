pub mod anexos;
pub mod consulta_titulos;
pub mod credores;
pub mod etapas;
pub mod filtros;
pub mod fluxo_titulos;
pub mod obras;
pub mod rateio;
pub mod read_cache;
pub mod realtime;
pub mod usuarios;

pub use anexos::AnexosService;
pub use consulta_titulos::ConsultaTitulos;
pub use credores::CredorDirectory;
pub use etapas::EtapasService;
pub use fluxo_titulos::{FluxoTitulos, ResultadoOperacao};
pub use obras::ObrasService;
pub use read_cache::ReadCache;
pub use realtime::{ChangeFeed, RealtimeHandle, RealtimeSync};
pub use usuarios::UsuariosService;
