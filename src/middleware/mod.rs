pub mod admin_auth;
pub mod sessao;

pub use admin_auth::require_admin_key;
pub use sessao::require_sessao;
