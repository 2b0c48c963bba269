//! Execution session controller.
//!
//! One controller per session owns the state object (language, source,
//! last run, availability, in-flight flag). Front ends hold a clone of the
//! controller, read state through [`SessionController::snapshot`] and drive
//! it through the operations below. The lock is never held across an
//! `.await`.

mod state;

pub use state::{
    Availability, ExecutionResult, Notice, Phase, RunRecord, RunStats, SessionState,
};

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
    language::Language,
    service::{ExecuteResponse, ExecutionRequest, ExecutionService, ServiceError},
};

pub struct SessionController<S: ?Sized> {
    service: Arc<S>,
    state: Arc<Mutex<SessionState>>,
    reprobe_on_execute: bool,
}

impl<S: ?Sized> Clone for SessionController<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            state: Arc::clone(&self.state),
            reprobe_on_execute: self.reprobe_on_execute,
        }
    }
}

impl<S: ExecutionService + ?Sized> SessionController<S> {
    pub fn new(service: Arc<S>, language: Language) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(SessionState::new(language))),
            reprobe_on_execute: false,
        }
    }

    /// Probe once more before rejecting `execute` when the service is not known to be up.
    pub fn with_reprobe(mut self, enabled: bool) -> Self {
        self.reprobe_on_execute = enabled;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn availability(&self) -> Availability {
        self.lock().availability
    }

    pub fn is_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    /// Switch language and load its template, discarding edits.
    pub fn select_language(&self, language: Language) {
        let mut st = self.lock();
        if st.language == language
            && st.source == language.template()
            && st.phase == Phase::Idle
            && st.last_run.is_none()
        {
            return;
        }
        debug!(language = language.wire_id(), "Language selected");
        st.language = language;
        st.source = language.template().to_string();
        st.phase = Phase::Idle;
        st.last_run = None;
    }

    /// Replace the source text with the user's latest edit.
    pub fn set_source(&self, source: impl Into<String>) {
        self.lock().source = source.into();
    }

    /// Probe the service and record the answer. Never retries.
    pub async fn check_availability(&self) -> Availability {
        let availability = match self.service.health().await {
            Ok(health) if health.is_healthy() => Availability::Available,
            Ok(health) => {
                warn!(status = %health.status, "Execution service reports unhealthy");
                Availability::Unavailable
            }
            Err(e) => {
                warn!(error = %e, "Execution service health check failed");
                Availability::Unavailable
            }
        };
        info!(%availability, "Execution service availability resolved");
        self.lock().availability = availability;
        availability
    }

    /// Submit the current source. Every failure is folded into the returned
    /// notice and the stored run record; this never errors.
    pub async fn execute(&self) -> Notice {
        if self.reprobe_on_execute && self.availability() != Availability::Available {
            self.check_availability().await;
        }

        let request = {
            let mut st = self.lock();
            if st.availability != Availability::Available {
                warn!(availability = %st.availability, "Execution rejected: service not available");
                return Notice::ServiceUnavailable;
            }
            if st.in_flight {
                debug!("Execution rejected: request already in flight");
                return Notice::AlreadyRunning;
            }
            st.in_flight = true;
            st.phase = Phase::Submitting;
            st.last_run = None;
            ExecutionRequest::new(st.language, st.source.clone())
        };
        let _in_flight = InFlightGuard { state: &self.state };

        let started = Instant::now();
        let outcome = self.service.execute(&request).await;
        let run = interpret(request.language, outcome, started.elapsed());
        let notice = if run.result.is_success() {
            Notice::ExecutionSucceeded
        } else {
            Notice::ExecutionFailed
        };
        info!(
            language = run.language.wire_id(),
            success = run.result.is_success(),
            elapsed_ms = run.elapsed.as_millis() as u64,
            "Execution completed"
        );

        let mut st = self.lock();
        st.stats.record(&run);
        st.phase = if run.result.is_success() { Phase::Succeeded } else { Phase::Failed };
        st.last_run = Some(run);
        notice
    }
}

/// Clears the in-flight flag on every exit path, including a dropped future.
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        st.in_flight = false;
        if st.phase == Phase::Submitting {
            st.phase = Phase::Idle;
        }
    }
}

/// Map the service's answer onto a run record.
pub fn interpret(
    language: Language,
    outcome: Result<ExecuteResponse, ServiceError>,
    measured: Duration,
) -> RunRecord {
    match outcome {
        Ok(resp) => {
            // Server times that do not fit a Duration fall back to the round trip.
            let elapsed = resp
                .execution_time
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .unwrap_or(measured);
            let result = match resp.error_message() {
                Some(message) => ExecutionResult::Failure { message: message.to_string() },
                None => ExecutionResult::Success { output: resp.output.clone().unwrap_or_default() },
            };
            RunRecord {
                language,
                result,
                exit_code: resp.exit_code,
                stderr: resp.stderr.filter(|s| !s.is_empty()),
                elapsed,
            }
        }
        Err(e) => RunRecord {
            language,
            result: ExecutionResult::Failure { message: e.diagnostic() },
            exit_code: None,
            stderr: None,
            elapsed: measured,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{HealthResponse, ServiceLanguage, GENERIC_FAILURE};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    type Reply = fn() -> Result<ExecuteResponse, ServiceError>;

    struct MockService {
        health: fn() -> Result<HealthResponse, ServiceError>,
        reply: Reply,
        delay: Duration,
        health_calls: AtomicUsize,
        execute_calls: AtomicUsize,
        last_request: Mutex<Option<ExecutionRequest>>,
        started: Notify,
    }

    impl MockService {
        fn new(reply: Reply) -> Self {
            Self {
                health: healthy,
                reply,
                delay: Duration::ZERO,
                health_calls: AtomicUsize::new(0),
                execute_calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                started: Notify::new(),
            }
        }

        fn with_health(mut self, health: fn() -> Result<HealthResponse, ServiceError>) -> Self {
            self.health = health;
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl ExecutionService for MockService {
        async fn health(&self) -> Result<HealthResponse, ServiceError> {
            self.health_calls.fetch_add(1, Ordering::SeqCst);
            (self.health)()
        }

        async fn execute(
            &self,
            request: &ExecutionRequest,
        ) -> Result<ExecuteResponse, ServiceError> {
            self.execute_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.started.notify_one();
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.reply)()
        }

        async fn languages(&self) -> Result<Vec<ServiceLanguage>, ServiceError> {
            Ok(Vec::new())
        }
    }

    fn health_with(status: &str) -> HealthResponse {
        HealthResponse {
            status: status.to_string(),
            docker_available: None,
            supported_languages: Vec::new(),
            version: None,
        }
    }

    fn healthy() -> Result<HealthResponse, ServiceError> {
        Ok(health_with("healthy"))
    }

    fn unhealthy() -> Result<HealthResponse, ServiceError> {
        Ok(health_with("unhealthy"))
    }

    fn unreachable() -> Result<HealthResponse, ServiceError> {
        Err(ServiceError::Transport("connection refused".into()))
    }

    fn hello() -> Result<ExecuteResponse, ServiceError> {
        Ok(ExecuteResponse { output: Some("Hello".into()), ..Default::default() })
    }

    fn syntax_error() -> Result<ExecuteResponse, ServiceError> {
        Ok(ExecuteResponse { error: Some("SyntaxError".into()), ..Default::default() })
    }

    fn timeout() -> Result<ExecuteResponse, ServiceError> {
        Err(ServiceError::Timeout)
    }

    fn controller(svc: MockService) -> (SessionController<MockService>, Arc<MockService>) {
        let svc = Arc::new(svc);
        (SessionController::new(Arc::clone(&svc), Language::Python), svc)
    }

    async fn ready(svc: MockService) -> (SessionController<MockService>, Arc<MockService>) {
        let (ctl, svc) = controller(svc);
        assert_eq!(ctl.check_availability().await, Availability::Available);
        (ctl, svc)
    }

    #[test]
    fn test_select_language_loads_template() {
        let (ctl, _) = controller(MockService::new(hello));
        for lang in Language::ALL {
            ctl.set_source("edited");
            ctl.select_language(lang);
            let st = ctl.snapshot();
            assert_eq!(st.language, lang);
            assert_eq!(st.source, lang.template());
        }
    }

    #[test]
    fn test_select_language_idempotent() {
        let (ctl, _) = controller(MockService::new(hello));
        ctl.select_language(Language::Java);
        let first = ctl.snapshot();
        ctl.select_language(Language::Java);
        ctl.select_language(Language::Java);
        assert_eq!(ctl.snapshot(), first);
    }

    #[tokio::test]
    async fn test_health_states() {
        let (ctl, _) = controller(MockService::new(hello));
        assert_eq!(ctl.availability(), Availability::Unknown);
        assert_eq!(ctl.check_availability().await, Availability::Available);

        let (ctl, _) = controller(MockService::new(hello).with_health(unhealthy));
        assert_eq!(ctl.check_availability().await, Availability::Unavailable);

        let (ctl, _) = controller(MockService::new(hello).with_health(unreachable));
        assert_eq!(ctl.check_availability().await, Availability::Unavailable);
        assert_eq!(ctl.availability(), Availability::Unavailable);
    }

    #[tokio::test]
    async fn test_execute_requires_availability() {
        let (ctl, svc) = controller(MockService::new(hello));
        assert_eq!(ctl.execute().await, Notice::ServiceUnavailable);

        let (ctl_down, svc_down) = controller(MockService::new(hello).with_health(unhealthy));
        ctl_down.check_availability().await;
        assert_eq!(ctl_down.execute().await, Notice::ServiceUnavailable);

        assert_eq!(svc.execute_calls.load(Ordering::SeqCst), 0);
        assert_eq!(svc_down.execute_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctl_down.snapshot().phase, Phase::Idle);
        assert_eq!(ctl_down.snapshot().stats.total, 0);
    }

    #[tokio::test]
    async fn test_execute_success() {
        let (ctl, svc) = ready(MockService::new(hello)).await;
        ctl.set_source("print('Hello')");

        assert_eq!(ctl.execute().await, Notice::ExecutionSucceeded);
        let st = ctl.snapshot();
        assert_eq!(st.phase, Phase::Succeeded);
        assert!(!st.in_flight);
        let run = st.last_run.unwrap();
        assert_eq!(run.result, ExecutionResult::Success { output: "Hello".into() });

        let sent = svc.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.language, Language::Python);
        assert_eq!(sent.source, "print('Hello')");
    }

    #[tokio::test]
    async fn test_execute_missing_output_is_empty_success() {
        fn empty() -> Result<ExecuteResponse, ServiceError> {
            Ok(ExecuteResponse::default())
        }
        let (ctl, _) = ready(MockService::new(empty)).await;
        assert_eq!(ctl.execute().await, Notice::ExecutionSucceeded);
        let run = ctl.snapshot().last_run.unwrap();
        assert_eq!(run.result, ExecutionResult::Success { output: String::new() });
    }

    #[tokio::test]
    async fn test_execute_error_field() {
        let (ctl, _) = ready(MockService::new(syntax_error)).await;
        assert_eq!(ctl.execute().await, Notice::ExecutionFailed);
        let st = ctl.snapshot();
        assert_eq!(st.phase, Phase::Failed);
        assert_eq!(
            st.last_run.unwrap().result,
            ExecutionResult::Failure { message: "SyntaxError".into() }
        );
    }

    #[tokio::test]
    async fn test_execute_timeout_clears_in_flight() {
        let (ctl, _) = ready(MockService::new(timeout)).await;
        assert_eq!(ctl.execute().await, Notice::ExecutionFailed);
        let st = ctl.snapshot();
        assert!(!st.in_flight);
        match st.last_run.unwrap().result {
            ExecutionResult::Failure { message } => assert!(!message.is_empty()),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_http_detail_is_shown() {
        fn rejected() -> Result<ExecuteResponse, ServiceError> {
            Err(ServiceError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                detail: Some("Docker service is not available".into()),
            })
        }
        let (ctl, _) = ready(MockService::new(rejected)).await;
        ctl.execute().await;
        let run = ctl.snapshot().last_run.unwrap();
        assert_eq!(run.result.text(), "Docker service is not available");
    }

    #[tokio::test]
    async fn test_overlapping_execute_rejected() {
        let (ctl, svc) = ready(MockService::new(hello).with_delay(Duration::from_millis(200))).await;

        let first = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.execute().await }
        });
        svc.started.notified().await;
        assert!(ctl.is_in_flight());
        assert_eq!(ctl.snapshot().phase, Phase::Submitting);
        assert_eq!(ctl.execute().await, Notice::AlreadyRunning);

        assert_eq!(first.await.unwrap(), Notice::ExecutionSucceeded);
        assert_eq!(svc.execute_calls.load(Ordering::SeqCst), 1);
        assert!(!ctl.is_in_flight());
    }

    #[tokio::test]
    async fn test_dropped_execute_clears_in_flight() {
        let (ctl, _) = ready(MockService::new(hello).with_delay(Duration::from_secs(5))).await;
        let res = tokio::time::timeout(Duration::from_millis(20), ctl.execute()).await;
        assert!(res.is_err());
        let st = ctl.snapshot();
        assert!(!st.in_flight);
        assert_eq!(st.phase, Phase::Idle);
        assert_eq!(st.stats.total, 0);
    }

    #[tokio::test]
    async fn test_select_language_returns_to_idle() {
        let (ctl, _) = ready(MockService::new(hello)).await;
        ctl.execute().await;
        assert_eq!(ctl.snapshot().phase, Phase::Succeeded);
        ctl.select_language(Language::Go);
        let st = ctl.snapshot();
        assert_eq!(st.phase, Phase::Idle);
        assert!(st.last_run.is_none());
        assert_eq!(st.source, Language::Go.template());
    }

    #[tokio::test]
    async fn test_reprobe_on_execute() {
        let (ctl, svc) = controller(MockService::new(hello));
        let ctl = ctl.with_reprobe(true);
        assert_eq!(ctl.execute().await, Notice::ExecutionSucceeded);
        assert_eq!(svc.health_calls.load(Ordering::SeqCst), 1);

        // Available now, so no further probes.
        ctl.execute().await;
        assert_eq!(svc.health_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_reprobe_by_default() {
        let (ctl, svc) = controller(MockService::new(hello));
        assert_eq!(ctl.execute().await, Notice::ServiceUnavailable);
        assert_eq!(svc.health_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stats_track_completed_runs() {
        let (ok, _) = ready(MockService::new(hello)).await;
        ok.execute().await;
        ok.execute().await;
        let stats = ok.snapshot().stats;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.success_rate(), 100.0);

        let (bad, _) = ready(MockService::new(syntax_error)).await;
        bad.execute().await;
        assert_eq!(bad.snapshot().stats.failed, 1);
        assert_eq!(bad.snapshot().stats.success_rate(), 0.0);
    }

    #[test]
    fn test_interpret_prefers_server_time() {
        let resp = ExecuteResponse {
            output: Some("x".into()),
            execution_time: Some(1.5),
            exit_code: Some(0),
            stderr: Some(String::new()),
            ..Default::default()
        };
        let run = interpret(Language::Go, Ok(resp), Duration::from_millis(10));
        assert_eq!(run.elapsed, Duration::from_millis(1500));
        assert_eq!(run.exit_code, Some(0));
        assert!(run.stderr.is_none());
        assert_eq!(run.language, Language::Go);
    }

    #[test]
    fn test_interpret_ignores_unrepresentable_server_time() {
        for secs in [1e20, -1.0, f64::NAN, f64::INFINITY] {
            let resp = ExecuteResponse {
                output: Some("x".into()),
                execution_time: Some(secs),
                ..Default::default()
            };
            let run = interpret(Language::Python, Ok(resp), Duration::from_millis(1));
            assert_eq!(run.elapsed, Duration::from_millis(1), "executionTime {}", secs);
            assert!(run.result.is_success());
        }
    }

    #[tokio::test]
    async fn test_huge_server_times_do_not_break_stats() {
        fn huge() -> Result<ExecuteResponse, ServiceError> {
            Ok(ExecuteResponse {
                output: Some("done".into()),
                execution_time: Some(1.5e19),
                ..Default::default()
            })
        }
        let (ctl, _) = ready(MockService::new(huge)).await;
        assert_eq!(ctl.execute().await, Notice::ExecutionSucceeded);
        assert_eq!(ctl.execute().await, Notice::ExecutionSucceeded);
        let st = ctl.snapshot();
        assert!(!st.in_flight);
        assert_eq!(st.stats.total, 2);
        assert_eq!(st.stats.total_elapsed, Duration::MAX);
    }

    #[test]
    fn test_interpret_generic_fallback() {
        let run = interpret(
            Language::Python,
            Err(ServiceError::Transport(String::new())),
            Duration::from_millis(3),
        );
        assert_eq!(run.result.text(), GENERIC_FAILURE);
        assert_eq!(run.elapsed, Duration::from_millis(3));
    }
}
