use crate::{
    api::{activity, announcements, calendar, documents, home, media, medical_leaves, permissions, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters, built once so every worker shares the same quotas.
#[derive(Clone)]
pub struct Limiters {
    login: Limiter,
    refresh: Limiter,
    protected: Limiter,
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {} requests/min", requests_per_min))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            refresh: build_limiter(config.rate_refresh_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    // Public routes
    cfg.service(
        web::scope(&format!("{}/auth", config.api_prefix))
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(limiters.refresh.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(limiters.refresh.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Stored uploads; the handler checks the bearer token itself
    cfg.service(
        web::resource("/media/{path:.*}")
            .wrap(limiters.protected.clone())
            .route(web::get().to(media::serve_media)),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(limiters.protected.clone())
            .service(web::resource("/home").route(web::get().to(home::home)))
            .service(
                web::scope("/users")
                    .service(
                        web::resource("")
                            .route(web::get().to(users::list_users))
                            .route(web::post().to(users::create_user)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(users::get_user))
                            .route(web::patch().to(users::update_user)),
                    ),
            )
            .service(
                web::scope("/documents")
                    .service(
                        web::resource("")
                            .route(web::get().to(documents::list_documents))
                            .route(web::post().to(documents::upload_document)),
                    )
                    .service(
                        web::resource("/{id}/archive")
                            .route(web::post().to(documents::archive_document)),
                    ),
            )
            .service(
                web::resource("/announcements")
                    .route(web::get().to(announcements::list_announcements))
                    .route(web::post().to(announcements::publish_announcement)),
            )
            .service(
                web::scope("/calendar")
                    .service(
                        web::resource("")
                            .route(web::get().to(calendar::list_events))
                            .route(web::post().to(calendar::create_event)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::patch().to(calendar::update_event))
                            .route(web::delete().to(calendar::delete_event)),
                    ),
            )
            .service(
                web::scope("/permissions")
                    .service(
                        web::resource("")
                            .route(web::get().to(permissions::list_permissions))
                            .route(web::post().to(permissions::submit_permission)),
                    )
                    // before /{id} so it is not taken for an id
                    .service(
                        web::resource("/form.pdf")
                            .route(web::get().to(permissions::permission_form_pdf)),
                    )
                    .service(
                        web::resource("/{id}").route(web::get().to(permissions::get_permission)),
                    )
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::post().to(permissions::cancel_permission)),
                    )
                    .service(
                        web::resource("/{id}/edit")
                            .route(web::get().to(permissions::edit_permission_form))
                            .route(web::post().to(permissions::edit_permission)),
                    ),
            )
            .service(
                web::resource("/admin/permissions/{id}")
                    .route(web::patch().to(permissions::admin_override_permission)),
            )
            .service(
                web::resource("/medical-leaves")
                    .route(web::get().to(medical_leaves::list_medical_leaves))
                    .route(web::post().to(medical_leaves::register_medical_leave)),
            )
            .service(web::resource("/activity").route(web::get().to(activity::list_activity))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::jwt::{Subject, generate_access_token},
        model::role::Role,
        utils::storage::MediaStore,
    };
    use actix_web::{App, http::StatusCode, http::header, test, web::Data};
    use sqlx::mysql::MySqlPoolOptions;
    use std::net::SocketAddr;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn bearer(config: &Config, role: Role) -> String {
        let token = generate_access_token(
            Subject {
                user_id: 7,
                username: "mgonzalez",
                role: role.id(),
            },
            &config.jwt_secret,
            config.access_token_ttl,
        )
        .unwrap();
        format!("Bearer {}", token)
    }

    macro_rules! test_app {
        ($config:expr, $media_root:expr) => {{
            let config: Config = $config;
            let limiters = Limiters::from_config(&config).unwrap();
            // never connects unless a handler runs a query
            let pool = MySqlPoolOptions::new()
                .connect_lazy(&config.database_url)
                .unwrap();
            let media = MediaStore::new($media_root, "/media");
            test::init_service(
                App::new()
                    .app_data(Data::new(pool))
                    .app_data(Data::new(config.clone()))
                    .app_data(Data::new(media))
                    .configure(|cfg| configure(cfg, &config, &limiters)),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn protected_routes_require_a_bearer_token() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(Config::for_tests(), dir.path());

        for uri in ["/api/v1/permissions", "/api/v1/home", "/api/v1/permissions/form.pdf"] {
            let req = test::TestRequest::get().uri(uri).peer_addr(peer()).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }

        let req = test::TestRequest::post()
            .uri("/api/v1/permissions/3/cancel")
            .peer_addr(peer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn refresh_tokens_are_not_access_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_tests();
        let (refresh, _) = crate::auth::jwt::generate_refresh_token(
            Subject {
                user_id: 7,
                username: "mgonzalez",
                role: Role::Staff.id(),
            },
            &config.jwt_secret,
            config.refresh_token_ttl,
        )
        .unwrap();
        let app = test_app!(config, dir.path());

        let req = test::TestRequest::get()
            .uri("/api/v1/permissions/form.pdf")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", refresh)))
            .peer_addr(peer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn leave_form_is_served_as_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_tests();
        let auth = bearer(&config, Role::Staff);
        let app = test_app!(config, dir.path());

        let req = test::TestRequest::get()
            .uri("/api/v1/permissions/form.pdf")
            .insert_header((header::AUTHORIZATION, auth))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        assert!(
            resp.headers()
                .get(header::CONTENT_DISPOSITION)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("inline")
        );
        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"%PDF-"));
    }

    #[actix_web::test]
    async fn admin_only_routes_answer_403_for_staff() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_tests();
        let auth = bearer(&config, Role::Staff);
        let app = test_app!(config, dir.path());

        let req = test::TestRequest::patch()
            .uri("/api/v1/admin/permissions/1")
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .set_json(serde_json::json!({ "status": "approved" }))
            .peer_addr(peer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/v1/activity")
            .insert_header((header::AUTHORIZATION, auth))
            .peer_addr(peer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn media_is_served_to_authenticated_users_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("documents/2024/03")).unwrap();
        std::fs::write(dir.path().join("documents/2024/03/abc_protocolo.pdf"), b"%PDF-1.4").unwrap();

        let config = Config::for_tests();
        let auth = bearer(&config, Role::Staff);
        let app = test_app!(config, dir.path());

        let req = test::TestRequest::get()
            .uri("/media/documents/2024/03/abc_protocolo.pdf")
            .peer_addr(peer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/media/documents/2024/03/abc_protocolo.pdf")
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "application/pdf");

        let req = test::TestRequest::get()
            .uri("/media/documents/2024/03/missing.pdf")
            .insert_header((header::AUTHORIZATION, auth))
            .peer_addr(peer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
