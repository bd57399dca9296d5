pub mod auth;
pub mod dashboard;
pub mod etapa;
pub mod notificacao;
pub mod processo;
