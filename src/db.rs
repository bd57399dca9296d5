pub mod usuario_repo;
pub use usuario_repo::UsuarioRepository;
pub mod processo_repo;
pub use processo_repo::ProcessoRepository;
pub mod notificacao_repo;
pub use notificacao_repo::NotificacaoRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
