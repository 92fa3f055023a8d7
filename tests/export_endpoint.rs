mod common;

use actix_web::{http::header, test, App};
use common::{empty_store, TestDb, ALL_MODES};
use department_management::db::Dialect;
use department_management::handlers::department_export::XLSX_CONTENT_TYPE;
use department_management::{add_department_services, ContextLifetime, RepositoryMode};
use serde_json::Value;

const EXPORT_URI: &str = "/api/DepartmentExport/Excel";

#[actix_web::test]
async fn export_of_empty_table_is_not_found() {
    let db = empty_store().await;
    let services =
        add_department_services(&db.url, RepositoryMode::Orm, Dialect::Sqlite, ContextLifetime::Shared).unwrap();
    let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

    let req = test::TestRequest::get().uri(EXPORT_URI).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No department records found.");
}

#[actix_web::test]
async fn export_returns_a_spreadsheet_for_every_mode() {
    let db = TestDb::new();
    db.table_builder().build_master_database().await.unwrap();

    for mode in ALL_MODES {
        let services =
            add_department_services(&db.url, mode, Dialect::Sqlite, ContextLifetime::Transient).unwrap();
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get().uri(EXPORT_URI).to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200, "{mode:?}");
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            XLSX_CONTENT_TYPE,
            "{mode:?}"
        );
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\""), "{mode:?}: {disposition}");
        assert!(disposition.ends_with("_Departments.xlsx\""), "{mode:?}: {disposition}");

        let body = test::read_body(resp).await;
        assert_eq!(&body[..2], b"PK", "{mode:?}");
    }
}

#[actix_web::test]
async fn only_get_is_routed() {
    let db = empty_store().await;
    let services =
        add_department_services(&db.url, RepositoryMode::RawSql, Dialect::Sqlite, ContextLifetime::Transient)
            .unwrap();
    let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

    let req = test::TestRequest::post().uri(EXPORT_URI).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 405);
}
