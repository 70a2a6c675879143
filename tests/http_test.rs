use ledger_sync::auth::{
    AuthGate, AuthStatus, FileTokenStore, MemoryTokenStore, Session, SignOutReason,
};
use ledger_sync::config::{ApiConfig, AppConfig, SyncConfig};
use ledger_sync::framework::{ListParams, RemoteCollection, SyncError, SyncState};
use ledger_sync::http::dashboard::{CATEGORY_DISTRIBUTION, MONTHLY_COMPARISON, SUMMARY, TREND};
use ledger_sync::http::reports::REPORT;
use ledger_sync::http::{
    ApiClient, HttpCollection, ListShape, LoginRequest, ProfileUpdate, ReportQuery, SessionError,
};
use ledger_sync::lifecycle::LedgerSystem;
use ledger_sync::model::{
    Category, CategoryCreate, PaymentMode, Transaction, TransactionCreate, TransactionKind,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: format!("{}/api", server.uri()),
        timeout_secs: 5,
        token_file: None,
    }
}

fn signed_in_gate(token: &str) -> Arc<AuthGate> {
    AuthGate::load(MemoryTokenStore::with_session(Session::new(token, json!({}))))
        .expect("memory store never fails")
}

fn transactions(client: &Arc<ApiClient>) -> HttpCollection<Transaction> {
    HttpCollection::new(
        Arc::clone(client),
        "transactions",
        ListShape::Paged {
            items_key: "transactions",
        },
    )
}

fn transaction_json(id: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "type": "income",
        "date": "2024-03-05",
        "amount": 1500.0,
        "category": "Salary",
        "paymentMode": "bank"
    })
}

#[tokio::test]
async fn test_list_sends_query_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/transactions"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .and(query_param("search", "salary"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [transaction_json("t1")],
            "total": 11,
            "totalPages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(ApiClient::new(&api_config(&server), signed_in_gate("tok-1")).unwrap());
    let page = transactions(&client)
        .list(ListParams {
            page: 2,
            page_size: 10,
            search: "salary".into(),
        })
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].kind, TransactionKind::Income);
    assert_eq!(page.total_count, 11);
    assert_eq!(page.total_pages, 2);
}

#[tokio::test]
async fn test_write_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/transactions"))
        .and(body_json(json!({
            "type": "income",
            "date": "2024-03-05",
            "amount": 1500.0,
            "category": "Salary",
            "paymentMode": "bank"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(transaction_json("t9")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/transactions/t9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(transaction_json("t9")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/transactions/t9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Deleted" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(ApiClient::new(&api_config(&server), signed_in_gate("tok")).unwrap());
    let collection = transactions(&client);
    let draft = TransactionCreate::new(
        TransactionKind::Income,
        "2024-03-05",
        1500.0,
        "Salary",
        PaymentMode::Bank,
    );

    let created = collection.create(draft.clone()).await.unwrap();
    assert_eq!(created.id, "t9");
    let updated = collection.update("t9".into(), draft).await.unwrap();
    assert_eq!(updated.amount, 1500.0);
    collection.delete("t9".into()).await.unwrap();
}

#[tokio::test]
async fn test_server_error_carries_payload_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/categories"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Category already exists" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/categories/c1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = Arc::new(ApiClient::new(&api_config(&server), signed_in_gate("tok")).unwrap());
    let categories: HttpCollection<Category> =
        HttpCollection::new(client, "categories", ListShape::Bare);

    let created = categories.create(CategoryCreate::new("Food")).await;
    assert_eq!(
        created.unwrap_err(),
        SyncError::server(400, "Category already exists")
    );

    let deleted = categories.delete("c1".into()).await;
    assert_eq!(
        deleted.unwrap_err(),
        SyncError::Server {
            status: 500,
            message: None
        }
    );
}

#[tokio::test]
async fn test_unauthorized_invalidates_gate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/transactions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })))
        .mount(&server)
        .await;

    let gate = signed_in_gate("expired");
    let mut status = gate.subscribe();
    let client = Arc::new(ApiClient::new(&api_config(&server), Arc::clone(&gate)).unwrap());

    let result = transactions(&client)
        .list(ListParams {
            page: 1,
            page_size: 10,
            search: String::new(),
        })
        .await;

    assert_eq!(result.unwrap_err(), SyncError::server(401, "Token expired"));
    assert!(gate.bearer().is_none());
    assert!(status.has_changed().unwrap());
    assert_eq!(
        *status.borrow_and_update(),
        AuthStatus::SignedOut(SignOutReason::Unauthorized)
    );
}

#[tokio::test]
async fn test_transport_failure_is_network_error() {
    let config = ApiConfig {
        // Nothing listens on port 1.
        base_url: "http://127.0.0.1:1/api".into(),
        timeout_secs: 2,
        token_file: None,
    };
    let client = Arc::new(ApiClient::new(&config, signed_in_gate("tok")).unwrap());

    let result = client.delete("transactions/t1").await;
    assert!(matches!(result, Err(SyncError::Network(_))));
}

#[tokio::test]
async fn test_login_signs_gate_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "asha@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "fresh",
            "name": "Asha",
            "email": "asha@example.com"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "No token" })))
        .mount(&server)
        .await;

    let gate = AuthGate::load(MemoryTokenStore::new()).unwrap();
    let client = ApiClient::new(&api_config(&server), Arc::clone(&gate)).unwrap();

    let session = client
        .login(&LoginRequest {
            email: "asha@example.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    assert_eq!(session.token, "fresh");
    assert_eq!(gate.bearer(), Some("fresh".into()));
    assert_eq!(gate.user(), Some(json!({ "name": "Asha", "email": "asha@example.com" })));
    assert_eq!(gate.status(), AuthStatus::SignedIn);

    let signup = client
        .signup(&ledger_sync::http::SignupRequest {
            name: "Ravi".into(),
            email: "ravi@example.com".into(),
            password: "secret".into(),
        })
        .await;
    assert!(matches!(signup, Err(SessionError::MissingToken)));
    // The existing session is untouched.
    assert_eq!(gate.bearer(), Some("fresh".into()));
}

#[tokio::test]
async fn test_profile_update_is_persisted_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Asha" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/auth/profile"))
        .and(body_json(json!({ "shopName": "Asha Stores", "gstNumber": "29ABCDE1234F1Z5" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Asha",
            "shopName": "Asha Stores",
            "gstNumber": "29ABCDE1234F1Z5"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = tempfile::TempDir::new().unwrap();
    let token_file = temp_dir.path().join("session.json");
    let gate = AuthGate::load(FileTokenStore::new(&token_file)).unwrap();
    gate.sign_in(Session::new("tok", json!({}))).unwrap();
    let client = ApiClient::new(&api_config(&server), Arc::clone(&gate)).unwrap();

    let profile = client.profile().await.unwrap();
    assert_eq!(profile, json!({ "name": "Asha" }));
    assert_eq!(gate.user(), Some(json!({ "name": "Asha" })));

    let updated = client
        .update_profile(&ProfileUpdate {
            shop_name: Some("Asha Stores".into()),
            gst_number: Some("29ABCDE1234F1Z5".into()),
            ..ProfileUpdate::default()
        })
        .await
        .unwrap();
    assert_eq!(updated["shopName"], "Asha Stores");

    // A restart sees the new profile next to the same token
    let restored = AuthGate::load(FileTokenStore::new(&token_file)).unwrap();
    assert_eq!(restored.bearer(), Some("tok".into()));
    assert_eq!(restored.user(), Some(updated));
}

#[tokio::test]
async fn test_profile_update_failure_keeps_profile() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/auth/profile"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid GST number" })),
        )
        .mount(&server)
        .await;

    let gate = AuthGate::load(MemoryTokenStore::with_session(Session::new(
        "tok",
        json!({ "name": "Asha" }),
    )))
    .unwrap();
    let client = ApiClient::new(&api_config(&server), Arc::clone(&gate)).unwrap();

    let result = client
        .update_profile(&ProfileUpdate {
            gst_number: Some("bogus".into()),
            ..ProfileUpdate::default()
        })
        .await;
    assert!(matches!(
        result,
        Err(SessionError::Request(SyncError::Server { status: 400, .. }))
    ));
    assert_eq!(gate.user(), Some(json!({ "name": "Asha" })));
}

#[tokio::test]
async fn test_daily_summary_sends_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/transactions/summary/daily"))
        .and(query_param("date", "2024-03-05"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "income": 1500,
            "expense": 200,
            "count": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&api_config(&server), signed_in_gate("tok")).unwrap();
    let summary = ledger_sync::http::daily_summary(&client, "2024-03-05")
        .await
        .unwrap();
    assert_eq!(summary["count"], 3);

    let missing = ledger_sync::http::daily_summary(&client, " ").await;
    assert_eq!(
        missing.unwrap_err(),
        SyncError::Validation("Date is required".into())
    );
}

// =============================================================================
// END-TO-END
// =============================================================================

#[tokio::test]
async fn test_ledger_system_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [transaction_json("t1"), transaction_json("t2")],
            "total": 2,
            "totalPages": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "c1", "name": "Salary", "isDefault": true }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/transactions/t1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Database unavailable" })),
        )
        .mount(&server)
        .await;
    for (endpoint, body) in [
        ("summary", json!({ "income": 1500, "expense": 200 })),
        ("trend", json!([{ "month": "2024-03", "income": 1500 }])),
        ("category-distribution", json!([{ "category": "Salary", "total": 1500 }])),
        ("monthly-comparison", json!({ "current": 1500, "previous": 900 })),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/api/dashboard/{endpoint}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }

    let config = AppConfig {
        api: api_config(&server),
        sync: SyncConfig::default(),
    };
    let system = LedgerSystem::with_auth(&config, signed_in_gate("tok")).unwrap();

    let view = system
        .transactions
        .wait_for(|view| view.state == SyncState::Ready)
        .await
        .unwrap();
    assert_eq!(view.items().len(), 2);

    let categories = system
        .categories
        .wait_for(|view| view.state == SyncState::Ready)
        .await
        .unwrap();
    assert!(categories.items()[0].is_default);

    // Optimistic delete rejected by the server
    system.transactions.remove("t1".into()).await.unwrap();
    assert_eq!(system.transactions.view().items().len(), 1);
    let view = system
        .transactions
        .wait_for(|view| view.error_notice().is_some())
        .await
        .unwrap();
    assert_eq!(view.items().len(), 2);
    assert_eq!(
        view.error_notice().map(|n| n.message.as_str()),
        Some("Database unavailable")
    );

    assert_eq!(system.load_dashboard().await, SyncState::Ready);
    let dashboard = system.dashboard.view();
    for slot in [SUMMARY, TREND, CATEGORY_DISTRIBUTION, MONTHLY_COMPARISON] {
        assert!(dashboard.slot(slot).is_some(), "missing {slot}");
    }
    assert_eq!(dashboard.slot(SUMMARY), Some(&json!({ "income": 1500, "expense": 200 })));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_dashboard_fails_as_a_whole() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/trend"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "Trend unavailable" })))
        .mount(&server)
        .await;
    // Every other dashboard endpoint answers
    for endpoint in ["summary", "category-distribution", "monthly-comparison"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/dashboard/{endpoint}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
    }

    let config = AppConfig {
        api: api_config(&server),
        sync: SyncConfig {
            fetch_on_mount: false,
            ..SyncConfig::default()
        },
    };
    let system = LedgerSystem::with_auth(&config, signed_in_gate("tok")).unwrap();

    let state = system.load_dashboard().await;
    assert_eq!(state, SyncState::Error("Trend unavailable".into()));
    assert!(system.dashboard.view().is_empty());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_reports_share_the_aggregate_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports/monthly"))
        .and(query_param("year", "2024"))
        .and(query_param("month", "03"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalIncome": 1500,
            "totalExpense": 200
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reports/vendor"))
        .and(query_param("vendor", "Metro"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let config = AppConfig {
        api: api_config(&server),
        sync: SyncConfig {
            fetch_on_mount: false,
            ..SyncConfig::default()
        },
    };
    let system = LedgerSystem::with_auth(&config, signed_in_gate("tok")).unwrap();

    let monthly = ReportQuery::monthly("2024-03").unwrap();
    assert_eq!(system.load_report(monthly).await.unwrap(), SyncState::Ready);
    let expected = json!({ "totalIncome": 1500, "totalExpense": 200 });
    assert_eq!(system.reports.view().slot(REPORT), Some(&expected));

    let vendor = ReportQuery::Vendor {
        vendor: "Metro".into(),
    };
    let state = system.load_report(vendor).await.unwrap();
    assert_eq!(state, SyncState::Error("Error generating report".into()));
    // The previous report stays visible
    assert_eq!(system.reports.view().slot(REPORT), Some(&expected));

    let blank = ReportQuery::Category {
        category: String::new(),
    };
    assert_eq!(
        system.load_report(blank).await.unwrap_err(),
        SyncError::Validation("Category is required".into())
    );

    system.shutdown().await.unwrap();
}
