//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to stand in for the registry API and a
//! temporary SQLite file as the target table, and run the full
//! fetch → normalize → load loop end-to-end.

use chrono::{Local, NaiveDate};
use cnpj_harvest::config::{
    ApiConfig, Config, DatabaseConfig, QueryConfig, RegistrationStatus, ScheduleConfig,
};
use cnpj_harvest::harvest::{run_once, FailureKind, Harvester};
use cnpj_harvest::output::RunOutcome;
use cnpj_harvest::record::{NormalizedRow, SchemaVariant};
use cnpj_harvest::state::RunPhase;
use cnpj_harvest::storage::{
    create_table_sql, open_store, RowStore, SqliteStore, StorageError, StorageResult, TableName,
};
use cnpj_harvest::HarvestError;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/v5/cnpj/pesquisa";
const API_KEY: &str = "test-key";

/// Creates a test configuration pointing at the mock registry
fn create_test_config(server: &MockServer, db_path: &str, variant: SchemaVariant) -> Config {
    Config {
        api: ApiConfig {
            endpoint: format!("{}{}?tipo_resultado=completo", server.uri(), SEARCH_PATH),
            api_key: API_KEY.to_string(),
            timeout_secs: 5,
        },
        query: QueryConfig {
            situacao_cadastral: vec![RegistrationStatus::Ativa],
            uf: vec!["PE".to_string()],
            page_size: 100,
            opened_from: Some("2024-12-15".to_string()),
            opened_to: Some("2024-12-15".to_string()),
            lookback_days: 0,
        },
        database: DatabaseConfig {
            path: db_path.to_string(),
            table: "empresas".to_string(),
            variant,
        },
        schedule: ScheduleConfig::default(),
    }
}

/// Opens a store in a fresh temp dir with the target table created
fn create_store(variant: SchemaVariant) -> (TempDir, String, SqliteStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("cnpj.db").display().to_string();

    let store = open_store(&DatabaseConfig {
        path: db_path.clone(),
        table: "empresas".to_string(),
        variant,
    })
    .expect("Failed to open store");
    store.initialize_table().expect("Failed to create table");

    (dir, db_path, store)
}

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 16).unwrap()
}

/// One registry record with a distinct CNPJ
fn company(i: usize) -> Value {
    json!({
        "cnpj": format!("{:014}", i),
        "cnpj_raiz": format!("{:08}", i),
        "filial_numero": 1,
        "razao_social": format!("EMPRESA {} LTDA", i),
        "qualificacao_responsavel": {"codigo": 49, "descricao": "Socio-Administrador"},
        "porte_empresa": {"codigo": "01", "descricao": "Micro Empresa"},
        "situacao_cadastral": {"situacao_atual": "ATIVA", "motivo": "SEM MOTIVO", "data": "2024-12-15"},
        "endereco": {
            "cep": "50050000",
            "tipo_logradouro": "RUA",
            "logradouro": "DA AURORA",
            "numero": "100",
            "bairro": "BOA VISTA",
            "uf": "PE",
            "municipio": "RECIFE",
            "ibge": {"codigo_municipio": 2611606, "codigo_uf": 26, "latitude": -8.0539, "longitude": -34.8811}
        },
        "data_abertura": "2024-12-15",
        "capital_social": 1000,
        "atividade_principal": {"codigo": "4712100", "descricao": "Comercio varejista"},
        "bloqueado": false,
        "mei": {"optante": true, "data_opcao_mei": "2024-12-15"},
        "simples": {"optante": true},
        "contato_telefonico": [{"completo": "81-1234-5678", "tipo": "FIXO"}],
        "contato_email": [{"email": format!("contato{}@example.com.br", i), "valido": true, "dominio": "example.com.br"}]
    })
}

/// Response body with records `offset..offset + count`
fn page_body(total: u64, offset: usize, count: usize) -> Value {
    let records: Vec<Value> = (offset..offset + count).map(company).collect();
    json!({"total": total, "cnpjs": records})
}

/// Mounts a response for one page number, expected exactly `times` times
async fn mount_page(server: &MockServer, page: u32, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(header("api-key", API_KEY))
        .and(body_partial_json(json!({"pagina": page})))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("Request recording is enabled")
        .len()
}

#[tokio::test]
async fn test_single_page_reaches_total() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        1,
        ResponseTemplate::new(200).set_body_json(page_body(150, 0, 150)),
        1,
    )
    .await;
    mount_page(&mock_server, 2, ResponseTemplate::new(200), 0).await;

    let (_dir, db_path, store) = create_store(SchemaVariant::Base);
    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Base);

    let mut harvester = Harvester::new(&config, store, run_date()).expect("Failed to build harvester");
    let summary = harvester.run().await.expect("Harvest failed");

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.pages_requested, 1);
    assert_eq!(summary.rows_inserted, 150);
    assert_eq!(summary.rows_rejected, 0);
    assert_eq!(harvester.store().count_rows().unwrap(), 150);
    assert_eq!(harvester.state().phase(), RunPhase::Done);
    assert_eq!(request_count(&mock_server).await, 1);
}

#[tokio::test]
async fn test_three_pages_then_stop() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, ResponseTemplate::new(200).set_body_json(page_body(250, 0, 100)), 1).await;
    mount_page(&mock_server, 2, ResponseTemplate::new(200).set_body_json(page_body(250, 100, 100)), 1).await;
    mount_page(&mock_server, 3, ResponseTemplate::new(200).set_body_json(page_body(250, 200, 50)), 1).await;
    mount_page(&mock_server, 4, ResponseTemplate::new(200).set_body_json(page_body(250, 250, 10)), 0).await;

    let (_dir, db_path, store) = create_store(SchemaVariant::Base);
    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Base);

    let mut harvester = Harvester::new(&config, store, run_date()).unwrap();
    let summary = harvester.run().await.expect("Harvest failed");

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.pages_requested, 3);
    assert_eq!(summary.cumulative_downloaded, 250);
    assert_eq!(summary.reported_total, 250);
    assert_eq!(harvester.store().count_rows().unwrap(), 250);
    assert_eq!(harvester.state().current_page(), 3);
    assert_eq!(request_count(&mock_server).await, 3);
}

#[tokio::test]
async fn test_server_error_fails_run() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        1,
        ResponseTemplate::new(500).set_body_string("internal error"),
        1,
    )
    .await;

    let (_dir, db_path, store) = create_store(SchemaVariant::Base);
    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Base);

    let mut harvester = Harvester::new(&config, store, run_date()).unwrap();
    let summary = harvester.run().await.expect("A failed fetch is not an error");

    assert_eq!(
        summary.outcome,
        RunOutcome::Failed(FailureKind::TransportOrStatusError)
    );
    assert!(!summary.is_success());
    assert_eq!(summary.rows_inserted, 0);
    assert_eq!(harvester.store().count_rows().unwrap(), 0);
    assert_eq!(harvester.state().phase(), RunPhase::Failed);
    assert_eq!(request_count(&mock_server).await, 1);
}

#[tokio::test]
async fn test_malformed_body_fails_run() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, ResponseTemplate::new(200).set_body_json(page_body(300, 0, 100)), 1).await;
    mount_page(
        &mock_server,
        2,
        ResponseTemplate::new(200).set_body_string("<html>upstream timeout</html>"),
        1,
    )
    .await;
    mount_page(&mock_server, 3, ResponseTemplate::new(200).set_body_json(page_body(300, 200, 100)), 0).await;

    let (_dir, db_path, store) = create_store(SchemaVariant::Base);
    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Base);

    let mut harvester = Harvester::new(&config, store, run_date()).unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Failed(FailureKind::MalformedBody));
    assert_eq!(summary.pages_requested, 2);
    // Rows from the good page stay committed
    assert_eq!(harvester.store().count_rows().unwrap(), 100);
}

#[tokio::test]
async fn test_empty_page_before_total_is_done() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, ResponseTemplate::new(200).set_body_json(page_body(250, 0, 100)), 1).await;
    mount_page(
        &mock_server,
        2,
        ResponseTemplate::new(200).set_body_json(json!({"total": 250, "cnpjs": []})),
        1,
    )
    .await;
    mount_page(&mock_server, 3, ResponseTemplate::new(200).set_body_json(page_body(250, 100, 100)), 0).await;

    let (_dir, db_path, store) = create_store(SchemaVariant::Base);
    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Base);

    let mut harvester = Harvester::new(&config, store, run_date()).unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(harvester.state().phase(), RunPhase::Done);
    assert_eq!(summary.pages_requested, 2);
    assert_eq!(summary.cumulative_downloaded, 100);
    assert_eq!(harvester.store().count_rows().unwrap(), 100);
}

#[tokio::test]
async fn test_latest_reported_total_wins() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, ResponseTemplate::new(200).set_body_json(page_body(300, 0, 100)), 1).await;
    mount_page(&mock_server, 2, ResponseTemplate::new(200).set_body_json(page_body(150, 100, 100)), 1).await;
    mount_page(&mock_server, 3, ResponseTemplate::new(200).set_body_json(page_body(150, 200, 100)), 0).await;

    let (_dir, db_path, store) = create_store(SchemaVariant::Base);
    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Base);

    let mut harvester = Harvester::new(&config, store, run_date()).unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.pages_requested, 2);
    assert_eq!(summary.reported_total, 150);
    assert_eq!(summary.cumulative_downloaded, 200);
}

#[tokio::test]
async fn test_rejected_row_does_not_stop_the_next() {
    let mock_server = MockServer::start().await;

    let mut body = page_body(3, 0, 3);
    body["cnpjs"][1]["razao_social"] = json!("REJEITAR");
    mount_page(&mock_server, 1, ResponseTemplate::new(200).set_body_json(body), 1).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cnpj.db").display().to_string();
    let table = TableName::parse("empresas").unwrap();
    let store = SqliteStore::open(std::path::Path::new(&db_path), table.clone(), SchemaVariant::Base).unwrap();
    let ddl = create_table_sql(&table, SchemaVariant::Base).replace(
        "razao_social TEXT CHECK (",
        "razao_social TEXT CHECK (razao_social <> 'REJEITAR') CHECK (",
    );
    store.connection().execute_batch(&ddl).unwrap();

    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Base);
    let mut harvester = Harvester::new(&config, store, run_date()).unwrap();
    let summary = harvester.run().await.expect("Data-validity rejections are absorbed");

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.rows_inserted, 2);
    assert_eq!(summary.rows_rejected, 1);

    assert_eq!(
        stored_cnpjs(harvester.store()),
        vec![format!("{:014}", 0), format!("{:014}", 2)]
    );
}

fn stored_cnpjs(store: &SqliteStore) -> Vec<String> {
    let mut stmt = store
        .connection()
        .prepare("SELECT cnpj FROM empresas ORDER BY id")
        .unwrap();
    let cnpjs: Vec<String> = stmt
        .query_map([], |r| r.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    cnpjs
}

/// Store that loses its connection after a fixed number of inserts
struct FlakyStore {
    inserted: u64,
    fail_after: u64,
}

impl RowStore for FlakyStore {
    fn insert_row(&mut self, _row: &NormalizedRow) -> StorageResult<()> {
        if self.inserted == self.fail_after {
            return Err(StorageError::Sqlite(rusqlite_busy()));
        }
        self.inserted += 1;
        Ok(())
    }

    fn count_rows(&self) -> StorageResult<u64> {
        Ok(self.inserted)
    }
}

fn rusqlite_busy() -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
        Some("database is locked".to_string()),
    )
}

#[tokio::test]
async fn test_other_store_error_aborts_run() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, ResponseTemplate::new(200).set_body_json(page_body(200, 0, 100)), 1).await;
    mount_page(&mock_server, 2, ResponseTemplate::new(200).set_body_json(page_body(200, 100, 100)), 0).await;

    let config = create_test_config(&mock_server, "/unused.db", SchemaVariant::Base);
    let store = FlakyStore {
        inserted: 0,
        fail_after: 10,
    };

    let mut harvester = Harvester::new(&config, store, run_date()).unwrap();
    let result = harvester.run().await;

    assert!(matches!(
        result,
        Err(HarvestError::Storage(StorageError::Sqlite(_)))
    ));
    assert_eq!(harvester.store().count_rows().unwrap(), 10);
    assert_eq!(request_count(&mock_server).await, 1);
}

#[tokio::test]
async fn test_request_body_and_stored_values() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, ResponseTemplate::new(200).set_body_json(page_body(1, 7, 1)), 1).await;

    let (_dir, db_path, store) = create_store(SchemaVariant::Base);
    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Base);

    let mut harvester = Harvester::new(&config, store, run_date()).unwrap();
    harvester.run().await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body,
        json!({
            "situacao_cadastral": ["ATIVA"],
            "uf": ["PE"],
            "data_abertura": {"inicio": "2024-12-15", "fim": "2024-12-15"},
            "limite": 100,
            "pagina": 1
        })
    );

    let (cnpj, phone, blocked, mei, email_valid, capital, latitude): (
        String,
        String,
        String,
        String,
        String,
        String,
        String,
    ) = harvester
        .store()
        .connection()
        .query_row(
            "SELECT cnpj, telefone_completo, bloqueado, mei_optante, email_valido,
                    capital_social, ibge_latitude
             FROM empresas",
            [],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                ))
            },
        )
        .unwrap();

    assert_eq!(cnpj, "00000000000007");
    assert_eq!(phone, "8112345678");
    assert_eq!(blocked, "False");
    assert_eq!(mei, "True");
    assert_eq!(email_valid, "True");
    assert_eq!(capital, "1000");
    assert_eq!(latitude, "-8.0539");
}

#[tokio::test]
async fn test_odd_phone_field_does_not_fail_the_page() {
    let mock_server = MockServer::start().await;

    let mut body = page_body(2, 0, 2);
    body["cnpjs"][1]["contato_telefonico"] = json!({});
    body["total"] = json!(null);
    mount_page(&mock_server, 1, ResponseTemplate::new(200).set_body_json(body), 1).await;

    let (_dir, db_path, store) = create_store(SchemaVariant::Base);
    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Base);

    let mut harvester = Harvester::new(&config, store, run_date()).unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.rows_inserted, 2);

    let phone: Option<String> = harvester
        .store()
        .connection()
        .query_row(
            "SELECT telefone_completo FROM empresas WHERE cnpj = ?1",
            [format!("{:014}", 1)],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(phone, None);
}

#[tokio::test]
async fn test_extended_layout_records_street_and_import_date() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, ResponseTemplate::new(200).set_body_json(page_body(2, 0, 2)), 1).await;

    let (_dir, db_path, store) = create_store(SchemaVariant::Extended);
    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Extended);

    let mut harvester = Harvester::new(&config, store, run_date()).unwrap();
    let summary = harvester.run().await.unwrap();
    assert_eq!(summary.rows_inserted, 2);

    let (street, imported): (String, String) = harvester
        .store()
        .connection()
        .query_row(
            "SELECT logradouro, data_importacao FROM empresas LIMIT 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(street, "DA AURORA");
    assert_eq!(imported, "16/12/2024");
}

#[tokio::test]
async fn test_run_once_end_to_end() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, ResponseTemplate::new(200).set_body_json(page_body(5, 0, 5)), 1).await;

    let (_dir, db_path, store) = create_store(SchemaVariant::Extended);
    drop(store);
    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Extended);

    let summary = run_once(&config).await.expect("Harvest failed");
    assert!(summary.is_success());
    assert_eq!(summary.rows_inserted, 5);

    let reopened = open_store(&config.database).unwrap();
    assert_eq!(reopened.count_rows().unwrap(), 5);

    let imported: String = reopened
        .connection()
        .query_row("SELECT data_importacao FROM empresas LIMIT 1", [], |r| r.get(0))
        .unwrap();
    assert_eq!(imported, Local::now().date_naive().format("%d/%m/%Y").to_string());
}

#[tokio::test]
async fn test_run_once_requires_existing_table() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, ResponseTemplate::new(200).set_body_json(page_body(1, 0, 1)), 0).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("empty.db").display().to_string();
    let config = create_test_config(&mock_server, &db_path, SchemaVariant::Base);

    let result = run_once(&config).await;
    assert!(matches!(
        result,
        Err(HarvestError::Storage(StorageError::TableNotFound(_)))
    ));
}
