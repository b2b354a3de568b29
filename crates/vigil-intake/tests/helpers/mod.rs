//! Test helpers: build an IntakeService wired to in-process collaborators.
//!
//! Run from workspace root: `cargo test -p vigil-intake`.
#![allow(dead_code)]

pub mod analyzer;
pub mod fixtures;

use analyzer::ScriptedAnalyzer;
use argon2::Params;
use chrono::Duration;
use std::sync::Arc;
use vigil_core::{SystemClock, VigilConfig};
use vigil_intake::IntakeService;
use vigil_services::InMemoryAuthProvider;

pub const TEST_EMAIL: &str = "agent@example.com";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub service: Arc<IntakeService>,
    pub auth: Arc<InMemoryAuthProvider>,
    pub analyzer: Arc<ScriptedAnalyzer>,
}

impl TestApp {
    pub async fn sign_in(&self) {
        self.service
            .sign_in(TEST_EMAIL, TEST_PASSWORD)
            .await
            .expect("sign in");
    }
}

pub fn test_config() -> VigilConfig {
    VigilConfig {
        environment: "test".to_string(),
        ..VigilConfig::default()
    }
}

/// Service with a registered (but signed-out) test user
pub async fn setup_signed_out(config: VigilConfig, analyzer: ScriptedAnalyzer) -> TestApp {
    let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("argon2 params");
    let auth = Arc::new(
        InMemoryAuthProvider::new(Arc::new(SystemClock), Duration::hours(1))
            .with_hasher_params(params),
    );
    auth.register(TEST_EMAIL, None, TEST_PASSWORD)
        .await
        .expect("register test user");

    let analyzer = Arc::new(analyzer);
    let service = Arc::new(IntakeService::new(
        &config,
        auth.clone(),
        analyzer.clone(),
        Arc::new(SystemClock),
    ));

    TestApp {
        service,
        auth,
        analyzer,
    }
}

/// Service with the test user signed in
pub async fn setup_test_app(analyzer: ScriptedAnalyzer) -> TestApp {
    let app = setup_signed_out(test_config(), analyzer).await;
    app.sign_in().await;
    app
}
