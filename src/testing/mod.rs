//! Testing utilities
//!
//! - [`Scenario`]: drive an axum router without a server and assert on the
//!   response, including the error body shape.
//! - [`TestTokens`]: HS256 access tokens (valid, expired, foreign).
//! - [`OrgFixture`]: an organization with one user per role.
//!
//! # Example
//!
//! ```rust,ignore
//! use ledgergate::testing::{self, OrgFixture, TestTokens};
//!
//! #[tokio::test]
//! async fn test_member_cannot_delete() {
//!     let fixture = OrgFixture::seeded();
//!     let tokens = TestTokens::default();
//!     let app = build_app(&fixture, &tokens);
//!
//!     testing::delete(app, &fixture.path("/accounts/..."))
//!         .bearer_token(&tokens.for_user(&fixture.member))
//!         .execute()
//!         .await
//!         .assert_forbidden()
//!         .assert_error("authorization_error", Some("insufficient_role"));
//! }
//! ```

mod fixtures;
mod scenario;
mod tokens;

pub use fixtures::{OrgFixture, TestUser, fake};
pub use scenario::{Scenario, ScenarioAssert, delete, get, patch, post};
pub use tokens::{TEST_SECRET, TestTokens};
