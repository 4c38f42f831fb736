//! Payment simulation.
//!
//! There is no real payment provider: a charge succeeds with probability
//! [`SUCCESS_RATE`] and fabricates a transaction id on success.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use common::Money;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Probability that a simulated charge is approved.
pub const SUCCESS_RATE: f64 = 0.8;

/// A charge to run against a mobile wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// Wallet name, e.g. `jazzcash` or `easypaisa`.
    pub method: String,
    pub phone: String,
    pub amount: Money,
}

/// Result of a charge. A decline is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub message: String,
}

impl PaymentOutcome {
    /// An approved charge with transaction id `METHOD` + `suffix`.
    pub fn approved(method: &str, suffix: u32) -> Self {
        Self {
            success: true,
            transaction_id: Some(format!("{}{suffix}", method.to_uppercase())),
            message: format!("Payment successful via {}", title_case(method)),
        }
    }

    pub fn declined(method: &str) -> Self {
        Self {
            success: false,
            transaction_id: None,
            message: format!(
                "Payment failed. Please check your {} account and try again.",
                title_case(method)
            ),
        }
    }
}

/// Runs one simulated charge with the given random source.
pub fn simulate_payment<R: Rng + ?Sized>(request: &PaymentRequest, rng: &mut R) -> PaymentOutcome {
    if rng.gen_bool(SUCCESS_RATE) {
        PaymentOutcome::approved(&request.method, rng.gen_range(100_000..=999_999))
    } else {
        PaymentOutcome::declined(&request.method)
    }
}

/// Upper-cases the first letter of every word and lower-cases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = !c.is_alphabetic();
    }
    out
}

/// Trait for payment processing.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the payer. Never fails; a decline is reported in the outcome.
    async fn charge(&self, request: &PaymentRequest) -> PaymentOutcome;
}

/// Production gateway: [`simulate_payment`] behind a shared random source.
#[derive(Debug)]
pub struct SimulatedPaymentGateway {
    rng: tokio::sync::Mutex<StdRng>,
}

impl SimulatedPaymentGateway {
    /// Creates a gateway seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: tokio::sync::Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a gateway with a reproducible sequence of outcomes.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: tokio::sync::Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for SimulatedPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, amount = %request.amount))]
    async fn charge(&self, request: &PaymentRequest) -> PaymentOutcome {
        let outcome = {
            let mut rng = self.rng.lock().await;
            simulate_payment(request, &mut *rng)
        };
        let label = if outcome.success { "approved" } else { "declined" };
        metrics::counter!("payments_simulated_total", "outcome" => label).increment(1);
        tracing::debug!(outcome = label, "payment simulated");
        outcome
    }
}

#[derive(Debug, Default)]
struct ScriptedState {
    queued: VecDeque<bool>,
    decline_when_empty: bool,
    charges: Vec<PaymentRequest>,
}

/// Gateway returning scripted outcomes, for tests.
///
/// Queued outcomes are consumed first; once the queue is empty every charge
/// is approved unless [`ScriptedPaymentGateway::set_decline`] was called.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPaymentGateway {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that declines every charge.
    pub fn declining() -> Self {
        let gateway = Self::new();
        gateway.set_decline(true);
        gateway
    }

    /// Sets the outcome used once the queue is exhausted.
    pub fn set_decline(&self, decline: bool) {
        self.lock().decline_when_empty = decline;
    }

    /// Queues the outcome of the next unanswered charge.
    pub fn push_outcome(&self, success: bool) {
        self.lock().queued.push_back(success);
    }

    /// Returns the number of charges made so far.
    pub fn charge_count(&self) -> usize {
        self.lock().charges.len()
    }

    /// Returns every charge made so far, oldest first.
    pub fn charges(&self) -> Vec<PaymentRequest> {
        self.lock().charges.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedPaymentGateway {
    async fn charge(&self, request: &PaymentRequest) -> PaymentOutcome {
        let mut state = self.lock();
        let success = state
            .queued
            .pop_front()
            .unwrap_or(!state.decline_when_empty);
        state.charges.push(request.clone());

        if success {
            PaymentOutcome::approved(&request.method, 100_000 + state.charges.len() as u32)
        } else {
            PaymentOutcome::declined(&request.method)
        }
    }
}
