use super::retry::run_with_retry;
use super::{Engine, SynthesisRequest, TtsBackend, TtsError};
use crate::domain::plan::PlanPolicy;
use std::sync::Arc;
use std::time::Duration;

/// Which backend a request resolves to. Decisions are a pure function of
/// (plan, requested engine); nothing sticks between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Baseline,
    Premium,
}

/// Routes synthesis calls between the baseline provider and an optional
/// premium provider, wrapping every provider call in the retry policy and a
/// per-call timeout.
///
/// A request for the baseline engine, or a plan that is not allowed the
/// premium engine, goes straight to the baseline backend. Premium failures
/// fall back exactly once to the baseline at the baseline engine, so the
/// caller still gets audio whenever the baseline is healthy.
pub struct RoutingBackend {
    baseline: Arc<dyn TtsBackend>,
    premium: Option<Arc<dyn TtsBackend>>,
    policy: Arc<PlanPolicy>,
    call_timeout: Duration,
}

impl RoutingBackend {
    pub fn new(
        baseline: Arc<dyn TtsBackend>,
        premium: Option<Arc<dyn TtsBackend>>,
        policy: Arc<PlanPolicy>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            baseline,
            premium,
            policy,
            call_timeout,
        }
    }

    pub fn route(&self, request: &SynthesisRequest) -> Route {
        if request.engine == Engine::Standard {
            return Route::Baseline;
        }
        if self.premium.is_none()
            || !self.policy.engine_allowed_for(request.engine, request.plan)
        {
            return Route::Baseline;
        }
        Route::Premium
    }

    /// Retry-wrapped, timeout-bounded call against a single backend. A
    /// timeout counts as a transient failure, subject to the attempt cap.
    async fn call(
        &self,
        backend: &dyn TtsBackend,
        request: &SynthesisRequest,
    ) -> Result<Vec<u8>, TtsError> {
        let timeout = self.call_timeout;
        run_with_retry(move || async move {
            match tokio::time::timeout(timeout, backend.synthesize(request)).await {
                Ok(result) => result,
                Err(_) => Err(TtsError::Timeout),
            }
        })
        .await
    }

    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        let premium = match self.route(request) {
            Route::Premium => self.premium.as_deref(),
            Route::Baseline => None,
        };

        if let Some(premium) = premium {
            match self.call(premium, request).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) => {
                    tracing::warn!(
                        provider = premium.name(),
                        plan = %request.plan,
                        error = %err,
                        "premium backend failed, downgrading to baseline standard"
                    );
                }
            }
        }

        let mut baseline_request = request.clone();
        baseline_request.engine = Engine::Standard;
        self.call(self.baseline.as_ref(), &baseline_request).await
    }
}
