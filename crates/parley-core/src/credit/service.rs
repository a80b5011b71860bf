//! CreditService trait definition.
//!
//! Implementations live in parley-infra (e.g., `HttpCreditService`).

use std::sync::Arc;

use parley_types::credit::BalanceError;

/// Trait for the external service that owns the user's credit balance.
///
/// Fetching is idempotent and side-effect free from the client's side, so
/// callers may refresh as often as they like.
pub trait CreditService: Send + Sync {
    fn fetch_balance(
        &self,
    ) -> impl std::future::Future<Output = Result<f64, BalanceError>> + Send;
}

impl<T: CreditService> CreditService for Arc<T> {
    fn fetch_balance(
        &self,
    ) -> impl std::future::Future<Output = Result<f64, BalanceError>> + Send {
        (**self).fetch_balance()
    }
}
