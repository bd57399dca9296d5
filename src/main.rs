// src/main.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de usuários (CRUD administrativo)
    let usuario_routes = Router::new()
        .route(
            "/",
            get(handlers::usuarios::listar_usuarios).post(handlers::usuarios::criar_usuario),
        )
        .route(
            "/funcionarios",
            get(handlers::usuarios::listar_funcionarios),
        )
        .route("/reset-password", post(handlers::usuarios::resetar_senha))
        .route(
            "/{id}",
            put(handlers::usuarios::atualizar_usuario)
                .delete(handlers::usuarios::deletar_usuario),
        );

    let tipos_routes = Router::new().route("/", get(handlers::tipos_processo::listar_tipos));

    let processo_routes = Router::new()
        .route(
            "/",
            get(handlers::processos::listar_processos)
                .post(handlers::processos::criar_processo_completo),
        )
        .route(
            "/{id}",
            get(handlers::processos::buscar_processo_por_id)
                .put(handlers::processos::atualizar_processo_completo)
                .delete(handlers::processos::deletar_processo_completo),
        );

    // Quadro de etapas de um processo
    let etapas_routes = Router::new().route(
        "/{processo_id}",
        get(handlers::etapas::etapas_por_processo),
    );

    // Tarefas por usuário + finalização
    let etapa_routes = Router::new()
        .route("/finalizar/{id}", put(handlers::etapas::finalizar_tarefa))
        .route(
            "/pendentes/{usuario_id}",
            get(handlers::etapas::contar_etapas_pendentes),
        )
        .route("/{usuario_id}", get(handlers::etapas::tarefas_por_usuario));

    let dashboard_routes =
        Router::new().route("/", get(handlers::dashboard::get_dashboard_data));

    // Tudo protegido pelo guard, exceto o login e o health check
    let protected = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .nest("/usuarios", usuario_routes)
        .nest("/tipos-processo", tipos_routes)
        .nest("/processo", processo_routes)
        .nest("/etapas", etapas_routes)
        .nest("/etapa", etapa_routes)
        .nest("/dashboard", dashboard_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/login", post(handlers::auth::login))
        .merge(protected)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
