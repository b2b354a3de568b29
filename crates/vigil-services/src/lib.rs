//! Vigil Services Layer
//!
//! External collaborators of the intake workflow: the authentication provider
//! and the authenticity analysis service client.

pub mod analysis;
pub mod auth;

pub use analysis::{
    AnalysisError, AnalysisRequest, AuthenticityAnalyzer, AuthenticityAssessment,
    HttpAuthenticityAnalyzer,
};
pub use auth::{AuthError, AuthProvider, InMemoryAuthProvider};
