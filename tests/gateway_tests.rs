//! Protocol operation tests against an in-memory connector.
//!
//! The fake connector records every connect, statement, commit, rollback and
//! close, and can be scripted to fail at any of those steps.

use mssql_mcp_gateway::database::{
    Connection, Connector, DriverError, QueryOutcome, SqlValue,
};
use mssql_mcp_gateway::{ConnectionDescriptor, MssqlMcpServer, ServerError, ServerSettings};
use rmcp::model::JsonObject;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

// =========================================================================
// Fake connector
// =========================================================================

#[derive(Debug, Default)]
struct Journal {
    connects: usize,
    closes: usize,
    commits: usize,
    rollbacks: usize,
    statements: Vec<String>,
    databases: Vec<String>,
}

#[derive(Default)]
struct Script {
    connect_error: Option<String>,
    outcomes: VecDeque<Result<QueryOutcome, DriverError>>,
    commit_error: Option<String>,
    rollback_error: Option<String>,
}

#[derive(Clone, Default)]
struct FakeConnector {
    journal: Arc<Mutex<Journal>>,
    script: Arc<Mutex<Script>>,
}

impl FakeConnector {
    fn returning(outcome: Result<QueryOutcome, DriverError>) -> Self {
        let connector = Self::default();
        connector.script.lock().unwrap().outcomes.push_back(outcome);
        connector
    }

    fn failing_connect(message: &str) -> Self {
        let connector = Self::default();
        connector.script.lock().unwrap().connect_error = Some(message.to_string());
        connector
    }

    fn fail_commit(self, message: &str) -> Self {
        self.script.lock().unwrap().commit_error = Some(message.to_string());
        self
    }

    fn fail_rollback(self, message: &str) -> Self {
        self.script.lock().unwrap().rollback_error = Some(message.to_string());
        self
    }

    fn journal(&self) -> std::sync::MutexGuard<'_, Journal> {
        self.journal.lock().unwrap()
    }
}

struct FakeConnection {
    journal: Arc<Mutex<Journal>>,
    script: Arc<Mutex<Script>>,
}

impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<FakeConnection, DriverError> {
        let mut journal = self.journal.lock().unwrap();
        journal.connects += 1;
        journal.databases.push(descriptor.database.clone());

        if let Some(message) = self.script.lock().unwrap().connect_error.clone() {
            return Err(DriverError::new(message));
        }

        Ok(FakeConnection {
            journal: Arc::clone(&self.journal),
            script: Arc::clone(&self.script),
        })
    }
}

impl Connection for FakeConnection {
    async fn execute(&mut self, sql: &str) -> Result<QueryOutcome, DriverError> {
        self.journal.lock().unwrap().statements.push(sql.to_string());
        self.script
            .lock()
            .unwrap()
            .outcomes
            .pop_front()
            .unwrap_or_else(|| Ok(QueryOutcome::affected_unknown()))
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.journal.lock().unwrap().commits += 1;
        match self.script.lock().unwrap().commit_error.clone() {
            Some(message) => Err(DriverError::new(message)),
            None => Ok(()),
        }
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        self.journal.lock().unwrap().rollbacks += 1;
        match self.script.lock().unwrap().rollback_error.clone() {
            Some(message) => Err(DriverError::new(message)),
            None => Ok(()),
        }
    }

    async fn close(self) -> Result<(), DriverError> {
        self.journal.lock().unwrap().closes += 1;
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn sql_auth_env() -> HashMap<String, String> {
    [
        ("MSSQL_SERVER", "db.internal"),
        ("MSSQL_USER", "app"),
        ("MSSQL_PASSWORD", "s3cret!"),
        ("MSSQL_DATABASE", "inventory"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn server_with(connector: FakeConnector) -> MssqlMcpServer<FakeConnector> {
    MssqlMcpServer::new(connector, Arc::new(sql_auth_env()), ServerSettings::default())
}

fn query_args(query: &str) -> JsonObject {
    match json!({ "query": query }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn table_rows(names: &[&str]) -> QueryOutcome {
    QueryOutcome::rows(
        vec!["TABLE_NAME".to_string()],
        names.iter().map(|n| vec![SqlValue::from(*n)]).collect(),
    )
}

// =========================================================================
// list_resources
// =========================================================================

#[tokio::test]
async fn test_list_resources_one_per_table() {
    let connector = FakeConnector::returning(Ok(table_rows(&["Users", "Orders"])));
    let server = server_with(connector.clone());

    let resources = server.list_resources().await.unwrap();

    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0].uri, "mssql://Users/data");
    assert_eq!(resources[0].name, "Table: Users");
    assert_eq!(resources[0].mime_type, "text/plain");
    assert_eq!(resources[0].description, "Data in table: Users");
    assert_eq!(resources[1].uri, "mssql://Orders/data");

    let journal = connector.journal();
    assert_eq!(
        journal.statements,
        vec!["SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_TYPE = 'BASE TABLE'"]
    );
    assert_eq!(journal.databases, vec!["inventory"]);
    assert_eq!(journal.closes, 1);
}

#[tokio::test]
async fn test_list_resources_empty_database() {
    let connector = FakeConnector::returning(Ok(table_rows(&[])));
    let server = server_with(connector);

    assert!(server.list_resources().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_resources_query_failure_yields_empty_list() {
    let connector = FakeConnector::returning(Err(DriverError::new("permission denied")));
    let server = server_with(connector.clone());

    let resources = server.list_resources().await.unwrap();

    assert!(resources.is_empty());
    assert_eq!(connector.journal().closes, 1);
}

#[tokio::test]
async fn test_list_resources_connect_failure_yields_empty_list() {
    let connector = FakeConnector::failing_connect("Login failed for user 'app'");
    let server = server_with(connector.clone());

    assert!(server.list_resources().await.unwrap().is_empty());
    assert_eq!(connector.journal().closes, 0);
}

#[tokio::test]
async fn test_list_resources_config_error_propagates() {
    let connector = FakeConnector::default();
    let server = MssqlMcpServer::new(
        connector.clone(),
        Arc::new(HashMap::<String, String>::new()),
        ServerSettings::default(),
    );

    let err = server.list_resources().await.unwrap_err();

    assert!(matches!(err, ServerError::Config(_)));
    assert_eq!(connector.journal().connects, 0);
}

// =========================================================================
// read_resource
// =========================================================================

#[tokio::test]
async fn test_read_resource_samples_table() {
    let connector = FakeConnector::returning(Ok(QueryOutcome::rows(
        vec!["id".to_string(), "name".to_string()],
        vec![
            vec![SqlValue::Int(1), SqlValue::from("a")],
            vec![SqlValue::Int(2), SqlValue::Null],
        ],
    )));
    let server = server_with(connector.clone());

    let text = server.read_resource("mssql://Users/data").await.unwrap();

    assert_eq!(text, "id,name\n1,a\n2,NULL");
    let journal = connector.journal();
    assert_eq!(journal.statements, vec!["SELECT TOP 100 * FROM [Users]"]);
    assert_eq!(journal.closes, 1);
    assert_eq!(journal.commits, 0);
}

#[tokio::test]
async fn test_read_resource_schema_qualified() {
    let connector = FakeConnector::returning(Ok(QueryOutcome::rows(
        vec!["x".to_string()],
        Vec::new(),
    )));
    let server = server_with(connector.clone());

    let text = server.read_resource("mssql://dbo.Users/data").await.unwrap();

    assert_eq!(text, "x\nQuery returned 0 rows.");
    assert_eq!(
        connector.journal().statements,
        vec!["SELECT TOP 100 * FROM [dbo].[Users]"]
    );
}

#[tokio::test]
async fn test_read_resource_injection_never_reaches_driver() {
    let connector = FakeConnector::default();
    let server = server_with(connector.clone());

    let err = server
        .read_resource("mssql://users; DROP TABLE users--/data")
        .await
        .unwrap_err();

    assert!(matches!(err, ServerError::InvalidIdentifier(_)));
    assert_eq!(connector.journal().connects, 0);
}

#[tokio::test]
async fn test_read_resource_wrong_scheme() {
    let connector = FakeConnector::default();
    let server = server_with(connector.clone());

    let err = server.read_resource("postgres://Users/data").await.unwrap_err();

    assert!(matches!(err, ServerError::InvalidUri(_)));
    assert_eq!(err.to_string(), "Invalid URI scheme: postgres://Users/data");
    assert_eq!(connector.journal().connects, 0);
}

#[tokio::test]
async fn test_read_resource_validates_before_config() {
    let server = MssqlMcpServer::new(
        FakeConnector::default(),
        Arc::new(HashMap::<String, String>::new()),
        ServerSettings::default(),
    );

    let err = server.read_resource("mssql://a'b/data").await.unwrap_err();
    assert!(matches!(err, ServerError::InvalidIdentifier(_)));

    let err = server.read_resource("mssql://Users/data").await.unwrap_err();
    assert!(matches!(err, ServerError::Config(_)));
}

#[tokio::test]
async fn test_read_resource_driver_failure_is_strict() {
    let connector =
        FakeConnector::returning(Err(DriverError::with_code("Invalid object name 'Nope'.", 208)));
    let server = server_with(connector.clone());

    let err = server.read_resource("mssql://Nope/data").await.unwrap_err();

    match err {
        ServerError::DatabaseOperation(ref inner) => {
            assert_eq!(inner.message(), "Invalid object name 'Nope'.");
            assert_eq!(inner.code(), Some(208));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(connector.journal().closes, 1);
}

#[tokio::test]
async fn test_read_resource_connect_failure_is_strict() {
    let connector = FakeConnector::failing_connect("network unreachable");
    let server = server_with(connector);

    let err = server.read_resource("mssql://Users/data").await.unwrap_err();
    assert!(matches!(err, ServerError::DatabaseOperation(_)));
    assert_eq!(err.to_string(), "Database error: network unreachable");
}

// =========================================================================
// list_tools / call_tool
// =========================================================================

#[test]
fn test_list_tools_default_name() {
    let server = server_with(FakeConnector::default());
    let tools = server.list_tools();

    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "execute_sql");
    assert_eq!(tools[0].description, "Execute an SQL query on the SQL Server");
}

#[tokio::test]
async fn test_call_tool_select_returns_rows_without_commit() {
    let connector = FakeConnector::returning(Ok(QueryOutcome::rows(
        vec!["n".to_string()],
        vec![vec![SqlValue::BigInt(42)]],
    )));
    let server = server_with(connector.clone());

    let output = server
        .call_tool("execute_sql", Some(&query_args("SELECT 42 AS n")))
        .await
        .unwrap();

    assert!(!output.is_error);
    assert_eq!(output.text, "n\n42");
    let journal = connector.journal();
    assert_eq!(journal.statements, vec!["SELECT 42 AS n"]);
    assert_eq!(journal.commits, 0);
    assert_eq!(journal.closes, 1);
}

#[tokio::test]
async fn test_call_tool_insert_commits_and_reports_count() {
    let connector = FakeConnector::returning(Ok(QueryOutcome::affected(3)));
    let server = server_with(connector.clone());

    let output = server
        .call_tool(
            "execute_sql",
            Some(&query_args("INSERT INTO t VALUES (1),(2),(3)")),
        )
        .await
        .unwrap();

    assert!(!output.is_error);
    assert_eq!(output.text, "Query executed successfully. Rows affected: 3");
    let journal = connector.journal();
    assert_eq!(journal.commits, 1);
    assert_eq!(journal.rollbacks, 0);
    assert_eq!(journal.closes, 1);
}

#[tokio::test]
async fn test_call_tool_ddl_without_count() {
    let connector = FakeConnector::returning(Ok(QueryOutcome::affected_unknown()));
    let server = server_with(connector.clone());

    let output = server
        .call_tool("execute_sql", Some(&query_args("CREATE TABLE t (id INT)")))
        .await
        .unwrap();

    assert_eq!(output.text, "Query executed successfully.");
    assert_eq!(connector.journal().commits, 1);
}

#[tokio::test]
async fn test_call_tool_query_is_sent_verbatim() {
    let sql = "  select 1; -- keep me\n";
    let connector = FakeConnector::default();
    let server = server_with(connector.clone());

    server
        .call_tool("execute_sql", Some(&query_args(sql)))
        .await
        .unwrap();

    assert_eq!(connector.journal().statements, vec![sql]);
}

#[tokio::test]
async fn test_call_tool_driver_failure_is_text_result() {
    let connector = FakeConnector::returning(Err(DriverError::new(
        "Incorrect syntax near 'SELEC'.",
    )));
    let server = server_with(connector.clone());

    let output = server
        .call_tool("execute_sql", Some(&query_args("SELEC 1")))
        .await
        .unwrap();

    assert!(output.is_error);
    assert_eq!(output.text, "Database error: Incorrect syntax near 'SELEC'.");
    let journal = connector.journal();
    assert_eq!(journal.rollbacks, 1);
    assert_eq!(journal.commits, 0);
    assert_eq!(journal.closes, 1);
}

#[tokio::test]
async fn test_call_tool_failed_rollback_keeps_query_error() {
    let connector = FakeConnector::returning(Err(DriverError::new("deadlock victim")))
        .fail_rollback("connection reset");
    let server = server_with(connector.clone());

    let output = server
        .call_tool("execute_sql", Some(&query_args("UPDATE t SET x = 1")))
        .await
        .unwrap();

    assert!(output.is_error);
    assert_eq!(output.text, "Database error: deadlock victim");
    assert_eq!(connector.journal().closes, 1);
}

#[tokio::test]
async fn test_call_tool_commit_failure_rolls_back() {
    let connector =
        FakeConnector::returning(Ok(QueryOutcome::affected(1))).fail_commit("commit refused");
    let server = server_with(connector.clone());

    let output = server
        .call_tool("execute_sql", Some(&query_args("DELETE FROM t WHERE id = 1")))
        .await
        .unwrap();

    assert!(output.is_error);
    assert_eq!(output.text, "Database error: commit refused");
    let journal = connector.journal();
    assert_eq!(journal.commits, 1);
    assert_eq!(journal.rollbacks, 1);
    assert_eq!(journal.closes, 1);
}

#[tokio::test]
async fn test_call_tool_connect_failure_is_text_result() {
    let connector = FakeConnector::failing_connect("Login failed for user 'app'.");
    let server = server_with(connector.clone());

    let output = server
        .call_tool("execute_sql", Some(&query_args("SELECT 1")))
        .await
        .unwrap();

    assert!(output.is_error);
    assert_eq!(output.text, "Database error: Login failed for user 'app'.");
    let journal = connector.journal();
    assert_eq!(journal.rollbacks, 0);
    assert_eq!(journal.closes, 0);
}

#[tokio::test]
async fn test_call_tool_unknown_name_before_io() {
    let connector = FakeConnector::default();
    let server = server_with(connector.clone());

    let err = server
        .call_tool("drop_everything", Some(&query_args("SELECT 1")))
        .await
        .unwrap_err();

    assert!(matches!(err, ServerError::UnknownTool(ref name) if name == "drop_everything"));
    assert_eq!(err.to_string(), "Unknown tool: drop_everything");
    assert_eq!(connector.journal().connects, 0);
}

#[tokio::test]
async fn test_call_tool_missing_query_before_io() {
    let connector = FakeConnector::default();
    let server = server_with(connector.clone());

    let not_a_string = match json!({ "query": 5 }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };

    for args in [None, Some(JsonObject::new()), Some(query_args("")), Some(not_a_string)] {
        let err = server
            .call_tool("execute_sql", args.as_ref())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
        assert_eq!(err.to_string(), "Query is required");
    }
    assert_eq!(connector.journal().connects, 0);
}

#[tokio::test]
async fn test_call_tool_custom_name() {
    let connector = FakeConnector::default();
    let settings = ServerSettings {
        tool_name: "run_query".to_string(),
        debug: false,
    };
    let server = MssqlMcpServer::new(connector.clone(), Arc::new(sql_auth_env()), settings);

    assert!(server
        .call_tool("execute_sql", Some(&query_args("SELECT 1")))
        .await
        .is_err());
    assert!(server
        .call_tool("run_query", Some(&query_args("SELECT 1")))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_each_call_opens_its_own_connection() {
    let connector = FakeConnector::default();
    let mut env = sql_auth_env();
    env.insert("MSSQL_DATABASE".to_string(), "first".to_string());
    let server = MssqlMcpServer::new(connector.clone(), Arc::new(env), ServerSettings::default());

    server
        .call_tool("execute_sql", Some(&query_args("SELECT 1")))
        .await
        .unwrap();
    server
        .call_tool("execute_sql", Some(&query_args("SELECT 2")))
        .await
        .unwrap();

    let journal = connector.journal();
    assert_eq!(journal.connects, 2);
    assert_eq!(journal.closes, 2);
    assert_eq!(journal.databases, vec!["first", "first"]);
}
