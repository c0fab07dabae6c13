use async_trait::async_trait;
use db_initializer::{
    load_credentials, Connector, Credentials, ErrorKind, FailurePolicy, InitError, Initializer,
    InitializerConfig, SecretSource, Session, SplitMode, StatementOutcome,
};
use lambda_runtime::{Context, LambdaEvent};
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Connect,
    Execute(String),
    Commit,
    Rollback,
    Close,
}

#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    fn executed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Execute(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }
}

/// In-memory stand-in for a MySQL server.
#[derive(Clone, Default)]
struct FakeDatabase {
    journal: Journal,
    unreachable: bool,
    /// Statements containing this text fail with a syntax error.
    reject: Option<String>,
    fail_commit: bool,
    fail_close: bool,
}

struct FakeSession {
    db: FakeDatabase,
}

#[async_trait]
impl Connector for FakeDatabase {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Session>, InitError> {
        if self.unreachable {
            return Err(InitError::ConnectTimeout {
                host: credentials.host.clone(),
                port: credentials.port,
                timeout: Duration::from_secs(10),
            });
        }
        self.journal.push(Call::Connect);
        Ok(Box::new(FakeSession { db: self.clone() }))
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn execute(&mut self, sql: &str) -> Result<StatementOutcome, sqlx::Error> {
        self.db.journal.push(Call::Execute(sql.to_string()));

        if let Some(reject) = &self.db.reject {
            if sql.contains(reject.as_str()) {
                return Err(sqlx::Error::Protocol(
                    "You have an error in your SQL syntax".to_string(),
                ));
            }
        }

        let rows = if sql.starts_with("SELECT") {
            vec!["(1)".to_string(), "(2)".to_string()]
        } else {
            Vec::new()
        };
        Ok(StatementOutcome { rows })
    }

    async fn commit(&mut self) -> Result<(), sqlx::Error> {
        if self.db.fail_commit {
            return Err(sqlx::Error::Protocol("Lost connection during commit".to_string()));
        }
        self.db.journal.push(Call::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), sqlx::Error> {
        self.db.journal.push(Call::Rollback);
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error> {
        if self.db.fail_close {
            return Err(sqlx::Error::Protocol("Connection reset by peer".to_string()));
        }
        self.db.journal.push(Call::Close);
        Ok(())
    }
}

struct FakeSecrets(HashMap<String, String>);

#[async_trait]
impl SecretSource for FakeSecrets {
    async fn get_secret(&self, secret_id: &str) -> Result<String, InitError> {
        self.0.get(secret_id).cloned().ok_or_else(|| {
            InitError::configuration(format!("secret {} not found", secret_id))
        })
    }
}

fn credentials() -> Credentials {
    Credentials {
        host: "db.internal".to_string(),
        port: 3306,
        username: "admin".to_string(),
        password: "secret".to_string(),
        dbname: "main".to_string(),
    }
}

fn script(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn initializer(script: &NamedTempFile, db: &FakeDatabase) -> Initializer {
    let config = InitializerConfig::new("db-secret", script.path());
    Initializer::new(config, credentials(), db.clone())
}

fn event() -> LambdaEvent<serde_json::Value> {
    LambdaEvent::new(
        json!({"RequestType": "Create", "ResourceProperties": {}}),
        Context::default(),
    )
}

const SCENARIO: &str = "CREATE TABLE t (id INT);\n\nINSERT INTO t VALUES (1);\n";

#[tokio::test]
async fn test_statements_run_in_file_order_then_commit() {
    let file = script(SCENARIO);
    let db = FakeDatabase::default();

    initializer(&file, &db).handle(event()).await.unwrap();

    assert_eq!(
        db.journal.calls(),
        vec![
            Call::Connect,
            Call::Execute("CREATE TABLE t (id INT)".to_string()),
            Call::Execute("INSERT INTO t VALUES (1)".to_string()),
            Call::Commit,
            Call::Close,
        ]
    );
}

#[tokio::test]
async fn test_line_mode_matches_legacy_behavior() {
    let file = script(SCENARIO);
    let db = FakeDatabase::default();
    let mut config = InitializerConfig::new("db-secret", file.path());
    config.split_mode = SplitMode::Lines;

    Initializer::new(config, credentials(), db.clone())
        .handle(event())
        .await
        .unwrap();

    assert_eq!(
        db.journal.executed(),
        vec!["CREATE TABLE t (id INT);", "INSERT INTO t VALUES (1);"]
    );
    assert_eq!(db.journal.calls()[3..], [Call::Commit, Call::Close]);
}

#[tokio::test]
async fn test_blank_script_commits_nothing_without_error() {
    let file = script("\n  \n\n");
    let db = FakeDatabase::default();

    let report = initializer(&file, &db).run().await.unwrap();

    assert_eq!(report.statements, 0);
    assert_eq!(
        db.journal.calls(),
        vec![Call::Connect, Call::Commit, Call::Close]
    );
}

#[tokio::test]
async fn test_invalid_statement_is_swallowed_and_rolled_back() {
    let file = script("SELEKT * FROM nowhere;\n");
    let db = FakeDatabase {
        reject: Some("SELEKT".to_string()),
        ..Default::default()
    };
    let init = initializer(&file, &db);

    assert!(init.handle(event()).await.is_ok());

    assert_eq!(
        db.journal.calls(),
        vec![
            Call::Connect,
            Call::Execute("SELEKT * FROM nowhere".to_string()),
            Call::Rollback,
            Call::Close,
        ]
    );
}

#[tokio::test]
async fn test_failing_statement_stops_the_sequence() {
    let file = script("CREATE TABLE a (id INT);\nINSERT INTO missing VALUES (1);\nCREATE TABLE c (id INT);\n");
    let db = FakeDatabase {
        reject: Some("missing".to_string()),
        ..Default::default()
    };

    let err = initializer(&file, &db).run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StatementExecution);
    match err {
        InitError::Statement { index, statement, .. } => {
            assert_eq!(index, 2);
            assert_eq!(statement, "INSERT INTO missing VALUES (1)");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(db.journal.executed().len(), 2);
    assert_eq!(db.journal.calls()[3..], [Call::Rollback, Call::Close]);
}

#[tokio::test]
async fn test_unreachable_database_is_swallowed() {
    let file = script(SCENARIO);
    let db = FakeDatabase {
        unreachable: true,
        ..Default::default()
    };
    let init = initializer(&file, &db);

    let err = init.run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);

    assert!(init.handle(event()).await.is_ok());
    assert!(db.journal.calls().is_empty());
}

#[tokio::test]
async fn test_missing_script_never_connects() {
    let db = FakeDatabase::default();
    let config = InitializerConfig::new("db-secret", "/nonexistent/script.sql");
    let init = Initializer::new(config, credentials(), db.clone());

    let err = init.run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resource);

    assert!(init.handle(event()).await.is_ok());
    assert!(db.journal.calls().is_empty());
}

#[tokio::test]
async fn test_propagate_policy_returns_failure() {
    let file = script("DROP TABLE nope;\n");
    let db = FakeDatabase {
        reject: Some("nope".to_string()),
        ..Default::default()
    };
    let mut config = InitializerConfig::new("db-secret", file.path());
    config.failure_policy = FailurePolicy::Propagate;
    let init = Initializer::new(config, credentials(), db.clone());

    let err = init.handle(event()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StatementExecution);
    assert_eq!(db.journal.calls()[2..], [Call::Rollback, Call::Close]);
}

#[tokio::test]
async fn test_commit_failure_is_reported() {
    let file = script(SCENARIO);
    let db = FakeDatabase {
        fail_commit: true,
        ..Default::default()
    };

    let err = initializer(&file, &db).run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Commit);
    assert_eq!(db.journal.executed().len(), 2);
    assert!(!db.journal.calls().contains(&Call::Commit));
    assert_eq!(db.journal.calls().last(), Some(&Call::Close));
}

#[tokio::test]
async fn test_close_failure_after_commit_still_succeeds() {
    let file = script(SCENARIO);
    let db = FakeDatabase {
        fail_close: true,
        ..Default::default()
    };
    let mut config = InitializerConfig::new("db-secret", file.path());
    config.failure_policy = FailurePolicy::Propagate;
    let init = Initializer::new(config, credentials(), db.clone());

    let report = init.run().await.unwrap();
    assert_eq!(report.statements, 2);
    assert_eq!(db.journal.calls().last(), Some(&Call::Commit));

    assert!(init.handle(event()).await.is_ok());
}

#[tokio::test]
async fn test_report_counts_rows() {
    let file = script("SELECT 1;\nSELECT 2;\nCREATE TABLE t (id INT);");
    let db = FakeDatabase::default();

    let report = initializer(&file, &db).run().await.unwrap();

    assert_eq!(report.statements, 3);
    assert_eq!(report.rows, 4);
}

#[tokio::test]
async fn test_startup_loads_credentials_from_secret() {
    let secrets = FakeSecrets(HashMap::from([(
        "db-secret".to_string(),
        r#"{"host":"db.internal","port":3306,"username":"admin","password":"pw","dbname":"main","engine":"mysql"}"#
            .to_string(),
    )]));

    let creds = load_credentials(&secrets, "db-secret").await.unwrap();
    assert_eq!(creds.host, "db.internal");
    assert_eq!(creds.port, 3306);
    assert_eq!(creds.dbname, "main");
}

#[tokio::test]
async fn test_startup_fails_when_port_missing() {
    let secrets = FakeSecrets(HashMap::from([(
        "db-secret".to_string(),
        r#"{"host":"db.internal","username":"admin","password":"pw","dbname":"main"}"#.to_string(),
    )]));

    let err = load_credentials(&secrets, "db-secret").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("port"));
}

#[tokio::test]
async fn test_startup_fails_when_secret_missing() {
    let secrets = FakeSecrets(HashMap::new());

    let err = load_credentials(&secrets, "db-secret").await.unwrap_err();
    assert!(err.kind().is_startup());
}
