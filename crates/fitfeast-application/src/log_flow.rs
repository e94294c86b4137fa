//! Food logging flow use case.
//!
//! This module provides the `LogFlowUseCase` which owns the screen state
//! machine of the logging session and coordinates the analysis gateway, the
//! nutrient scaler and the stores. All transient state (captured image,
//! pending analysis result, chosen weight, banner message) lives here and is
//! mutated only through the transition handlers below.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use fitfeast_core::analysis::{AnalysisOutcome, FoodAnalyzer, RejectionReason};
use fitfeast_core::food::FoodItem;
use fitfeast_core::id::IdGenerator;
use fitfeast_core::log::{DailyLog, LogRepository};
use fitfeast_core::nutrition::{PortionNutrients, clamp_portion_weight, scale_portion};
use fitfeast_core::user::{ProfileRepository, UserProfile};

/// Banner shown when the gateway judged the capture not to be usable food.
pub const NO_FOOD_BANNER: &str = "No food recognized. Re-aim at the plate and try again.";
/// Banner shown when the analysis call failed on the wire or returned junk.
pub const NETWORK_BANNER: &str = "Network hiccup while analyzing. Please try again.";

/// The screens of the logging session.
///
/// The session starts on `Home` and has no terminal screen; `Analyzing` is
/// the only screen with an outstanding gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Dashboard with today's intake.
    Home,
    /// Profile editing.
    Profile,
    /// Waiting for a capture.
    Scanning,
    /// Analysis call in flight.
    Analyzing,
    /// Reviewing an accepted result, adjusting the portion weight.
    Result,
    /// Browsing and deleting past entries.
    History,
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Screen::Home => "home",
            Screen::Profile => "profile",
            Screen::Scanning => "scanning",
            Screen::Analyzing => "analyzing",
            Screen::Result => "result",
            Screen::History => "history",
        };
        write!(f, "{}", name)
    }
}

/// A transition that is not available from the current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// The requested operation does not exist on the current screen.
    #[error("operation not available on the {0} screen")]
    WrongScreen(Screen),
    /// A capture was attempted while an analysis is still in flight.
    #[error("an analysis is already in flight")]
    AnalysisInFlight,
}

/// Transient session state owned by the use case.
struct FlowState {
    screen: Screen,
    /// Base64 JPEG retained from capture until save or discard.
    captured_image: Option<String>,
    /// Accepted analysis result awaiting portion confirmation.
    pending_item: Option<FoodItem>,
    /// Portion weight the user has settled on, in grams.
    chosen_weight_grams: f64,
    /// Short-lived error message shown on the scanning screen.
    banner: Option<String>,
}

impl Default for FlowState {
    fn default() -> Self {
        Self {
            screen: Screen::Home,
            captured_image: None,
            pending_item: None,
            chosen_weight_grams: 100.0,
            banner: None,
        }
    }
}

/// Use case driving the capture → analyze → review → save flow.
///
/// Collaborators are injected at construction; nothing else may mutate the
/// log collection, the profile or the transient working state.
pub struct LogFlowUseCase {
    /// Store for persisted daily log entries.
    log_repository: Arc<dyn LogRepository>,
    /// Store for the singleton user profile.
    profile_repository: Arc<dyn ProfileRepository>,
    /// Boundary to the external vision service.
    analyzer: Arc<dyn FoodAnalyzer>,
    /// Source of identifiers for saved entries.
    id_generator: Arc<dyn IdGenerator>,
    /// Transient session state.
    state: RwLock<FlowState>,
}

impl LogFlowUseCase {
    /// Creates a new `LogFlowUseCase` starting on the home screen.
    pub fn new(
        log_repository: Arc<dyn LogRepository>,
        profile_repository: Arc<dyn ProfileRepository>,
        analyzer: Arc<dyn FoodAnalyzer>,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            log_repository,
            profile_repository,
            analyzer,
            id_generator,
            state: RwLock::new(FlowState::default()),
        }
    }

    // ===== Accessors =====

    /// Current screen.
    pub async fn screen(&self) -> Screen {
        self.state.read().await.screen
    }

    /// Pending banner message, if any.
    pub async fn banner(&self) -> Option<String> {
        self.state.read().await.banner.clone()
    }

    /// The accepted analysis result under review, if any.
    pub async fn pending_item(&self) -> Option<FoodItem> {
        self.state.read().await.pending_item.clone()
    }

    /// The portion weight currently chosen on the result screen.
    pub async fn chosen_weight(&self) -> f64 {
        self.state.read().await.chosen_weight_grams
    }

    /// The full log collection, newest first.
    pub async fn logs(&self) -> Vec<DailyLog> {
        self.log_repository.load_all().await
    }

    /// The current user profile.
    pub async fn profile(&self) -> UserProfile {
        self.profile_repository.load().await
    }

    // ===== Profile =====

    /// Home → Profile.
    pub async fn open_profile(&self) -> Result<(), FlowError> {
        self.transition(Screen::Home, Screen::Profile).await
    }

    /// Profile → Home, persisting the edited record.
    ///
    /// The write is fire-and-forget: a failed persist is logged, not
    /// surfaced.
    pub async fn save_profile(&self, profile: UserProfile) -> Result<(), FlowError> {
        self.transition(Screen::Profile, Screen::Home).await?;
        if let Err(e) = self.profile_repository.save(&profile).await {
            tracing::warn!(error = %e, "failed to persist profile");
        }
        Ok(())
    }

    /// Profile → Home without saving.
    pub async fn back_home(&self) -> Result<(), FlowError> {
        self.transition(Screen::Profile, Screen::Home).await
    }

    // ===== Capture =====

    /// Home → Scanning.
    pub async fn start_scanning(&self) -> Result<(), FlowError> {
        self.transition(Screen::Home, Screen::Scanning).await
    }

    /// Scanning → Home.
    pub async fn cancel_scanning(&self) -> Result<(), FlowError> {
        self.transition(Screen::Scanning, Screen::Home).await
    }

    /// Scanning → Analyzing → Result | Scanning.
    ///
    /// Runs the single analysis attempt to completion; there is no
    /// cancel-in-flight. A second capture while `Analyzing` is refused.
    pub async fn capture(&self, image_base64: String) -> Result<(), FlowError> {
        {
            let mut state = self.state.write().await;
            match state.screen {
                Screen::Scanning => {}
                Screen::Analyzing => return Err(FlowError::AnalysisInFlight),
                other => return Err(FlowError::WrongScreen(other)),
            }
            state.screen = Screen::Analyzing;
            state.banner = None;
            state.captured_image = Some(image_base64.clone());
        }

        // The lock is not held across the gateway round-trip; the Analyzing
        // screen itself guards against a second capture.
        let outcome = self.analyzer.analyze(&image_base64).await;

        let mut state = self.state.write().await;
        match outcome {
            AnalysisOutcome::Accepted(item) => {
                tracing::info!(food = %item.name, "analysis accepted");
                // The model's estimate is not bound by the slider contract.
                state.chosen_weight_grams = clamp_portion_weight(item.estimated_weight_grams);
                state.pending_item = Some(item);
                state.screen = Screen::Result;
            }
            AnalysisOutcome::Rejected(reason) => {
                tracing::info!(?reason, "analysis rejected");
                state.banner = Some(banner_for(reason).to_string());
                state.captured_image = None;
                state.screen = Screen::Scanning;
            }
        }
        Ok(())
    }

    // ===== Result review =====

    /// Sets the portion weight on the result screen, clamped to the
    /// interactive domain.
    pub async fn set_weight(&self, weight_grams: f64) -> Result<(), FlowError> {
        let mut state = self.state.write().await;
        if state.screen != Screen::Result {
            return Err(FlowError::WrongScreen(state.screen));
        }
        state.chosen_weight_grams = clamp_portion_weight(weight_grams);
        Ok(())
    }

    /// Nutrient totals for the pending item at the current weight.
    ///
    /// Re-derived on every call; never cached against a stale weight.
    pub async fn portion_preview(&self) -> Result<PortionNutrients, FlowError> {
        let state = self.state.read().await;
        match (&state.screen, &state.pending_item) {
            (Screen::Result, Some(item)) => {
                Ok(scale_portion(&item.per_100g, state.chosen_weight_grams))
            }
            _ => Err(FlowError::WrongScreen(state.screen)),
        }
    }

    /// Result → Home: converts the pending item into a persisted entry.
    ///
    /// Persistence is fire-and-forget; the in-memory flow always returns to
    /// an interactive state.
    pub async fn save_entry(&self) -> Result<(), FlowError> {
        let log = {
            let mut state = self.state.write().await;
            if state.screen != Screen::Result {
                return Err(FlowError::WrongScreen(state.screen));
            }
            let item = match state.pending_item.take() {
                Some(item) => item,
                None => return Err(FlowError::WrongScreen(state.screen)),
            };
            let image = state.captured_image.take().unwrap_or_default();
            let log = DailyLog::record(
                self.id_generator.generate(),
                Utc::now(),
                &item,
                state.chosen_weight_grams,
                image,
            );
            state.screen = Screen::Home;
            state.banner = None;
            log
        };

        if let Err(e) = self.log_repository.append(log).await {
            tracing::warn!(error = %e, "failed to persist log entry");
        }
        Ok(())
    }

    /// Result → Scanning, discarding the pending item.
    pub async fn discard_result(&self) -> Result<(), FlowError> {
        let mut state = self.state.write().await;
        if state.screen != Screen::Result {
            return Err(FlowError::WrongScreen(state.screen));
        }
        state.pending_item = None;
        state.captured_image = None;
        state.screen = Screen::Scanning;
        Ok(())
    }

    // ===== History =====

    /// Home → History.
    pub async fn open_history(&self) -> Result<(), FlowError> {
        self.transition(Screen::Home, Screen::History).await
    }

    /// History → Home.
    pub async fn close_history(&self) -> Result<(), FlowError> {
        self.transition(Screen::History, Screen::Home).await
    }

    /// Deletes one entry from the history screen. Deleting an absent id is
    /// a no-op.
    pub async fn delete_entry(&self, id: &str) -> Result<(), FlowError> {
        {
            let state = self.state.read().await;
            if state.screen != Screen::History {
                return Err(FlowError::WrongScreen(state.screen));
            }
        }
        if let Err(e) = self.log_repository.remove(id).await {
            tracing::warn!(error = %e, "failed to delete log entry");
        }
        Ok(())
    }

    // ===== Internal =====

    /// Moves `from` → `to`, clearing the banner (navigation dismisses it).
    async fn transition(&self, from: Screen, to: Screen) -> Result<(), FlowError> {
        let mut state = self.state.write().await;
        if state.screen != from {
            return Err(FlowError::WrongScreen(state.screen));
        }
        state.banner = None;
        state.screen = to;
        Ok(())
    }
}

/// Chooses the user-facing banner from the tagged rejection reason.
fn banner_for(reason: RejectionReason) -> &'static str {
    match reason {
        RejectionReason::NotFood | RejectionReason::LowConfidence => NO_FOOD_BANNER,
        RejectionReason::Transport | RejectionReason::Malformed => NETWORK_BANNER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitfeast_core::error::Result as CoreResult;
    use fitfeast_core::nutrition::NutrientProfile;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::{Mutex, Notify};

    struct InMemoryLogRepository {
        logs: Mutex<Vec<DailyLog>>,
    }

    impl InMemoryLogRepository {
        fn new() -> Self {
            Self {
                logs: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LogRepository for InMemoryLogRepository {
        async fn append(&self, log: DailyLog) -> CoreResult<()> {
            self.logs.lock().await.insert(0, log);
            Ok(())
        }

        async fn remove(&self, id: &str) -> CoreResult<()> {
            self.logs.lock().await.retain(|log| log.id != id);
            Ok(())
        }

        async fn load_all(&self) -> Vec<DailyLog> {
            self.logs.lock().await.clone()
        }
    }

    struct InMemoryProfileRepository {
        profile: Mutex<UserProfile>,
    }

    impl InMemoryProfileRepository {
        fn new() -> Self {
            Self {
                profile: Mutex::new(UserProfile::default()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ProfileRepository for InMemoryProfileRepository {
        async fn load(&self) -> UserProfile {
            self.profile.lock().await.clone()
        }

        async fn save(&self, profile: &UserProfile) -> CoreResult<()> {
            *self.profile.lock().await = profile.clone();
            Ok(())
        }
    }

    /// Analyzer double returning a scripted outcome.
    struct ScriptedAnalyzer {
        outcome: AnalysisOutcome,
    }

    #[async_trait::async_trait]
    impl FoodAnalyzer for ScriptedAnalyzer {
        async fn analyze(&self, _image_base64: &str) -> AnalysisOutcome {
            self.outcome.clone()
        }
    }

    /// Analyzer double that blocks until released, for in-flight tests.
    struct GatedAnalyzer {
        gate: Arc<Notify>,
        outcome: AnalysisOutcome,
    }

    #[async_trait::async_trait]
    impl FoodAnalyzer for GatedAnalyzer {
        async fn analyze(&self, _image_base64: &str) -> AnalysisOutcome {
            self.gate.notified().await;
            self.outcome.clone()
        }
    }

    struct SequentialIdGenerator {
        counter: AtomicU64,
    }

    impl SequentialIdGenerator {
        fn new() -> Self {
            Self {
                counter: AtomicU64::new(0),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn generate(&self) -> String {
            format!("id-{}", self.counter.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn apple_item() -> FoodItem {
        FoodItem {
            id: "food-1".to_string(),
            name: "apple".to_string(),
            per_100g: NutrientProfile {
                calories: 52.0,
                protein: 0.3,
                carbs: 14.0,
                fat: 0.2,
            },
            estimated_weight_grams: 150.0,
        }
    }

    fn flow_with(outcome: AnalysisOutcome) -> (LogFlowUseCase, Arc<InMemoryLogRepository>) {
        let logs = Arc::new(InMemoryLogRepository::new());
        let flow = LogFlowUseCase::new(
            logs.clone(),
            Arc::new(InMemoryProfileRepository::new()),
            Arc::new(ScriptedAnalyzer { outcome }),
            Arc::new(SequentialIdGenerator::new()),
        );
        (flow, logs)
    }

    #[tokio::test]
    async fn test_initial_screen_is_home() {
        let (flow, _) = flow_with(AnalysisOutcome::Rejected(RejectionReason::NotFood));
        assert_eq!(flow.screen().await, Screen::Home);
        assert!(flow.banner().await.is_none());
    }

    #[tokio::test]
    async fn test_capture_to_save_end_to_end() {
        let (flow, logs) = flow_with(AnalysisOutcome::Accepted(apple_item()));

        flow.start_scanning().await.unwrap();
        flow.capture("aW1hZ2UteA==".to_string()).await.unwrap();

        assert_eq!(flow.screen().await, Screen::Result);
        assert_eq!(flow.chosen_weight().await, 150.0);

        flow.set_weight(200.0).await.unwrap();
        let preview = flow.portion_preview().await.unwrap();
        assert_eq!(preview.calories, 104);
        assert_eq!(preview.protein, 0.6);
        assert_eq!(preview.carbs, 28.0);
        assert_eq!(preview.fat, 0.4);

        flow.save_entry().await.unwrap();
        assert_eq!(flow.screen().await, Screen::Home);
        assert!(flow.pending_item().await.is_none());

        let saved = logs.load_all().await;
        assert_eq!(saved.len(), 1);
        let entry = &saved[0];
        assert_eq!(entry.food_name, "apple");
        assert_eq!(entry.weight_grams, 200.0);
        assert_eq!(entry.nutrients.calories, 104);
        assert_eq!(entry.nutrients.protein, 0.6);
        assert_eq!(entry.nutrients.carbs, 28.0);
        assert_eq!(entry.nutrients.fat, 0.4);
        assert_eq!(entry.image_base64, "aW1hZ2UteA==");
        assert!(!entry.id.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_capture_returns_to_scanning_with_banner() {
        let (flow, logs) = flow_with(AnalysisOutcome::Rejected(RejectionReason::NotFood));

        flow.start_scanning().await.unwrap();
        flow.capture("aW1hZ2UteQ==".to_string()).await.unwrap();

        assert_eq!(flow.screen().await, Screen::Scanning);
        assert_eq!(flow.banner().await.as_deref(), Some(NO_FOOD_BANNER));
        assert!(flow.pending_item().await.is_none());
        assert!(logs.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_rejection_uses_network_banner() {
        let (flow, _) = flow_with(AnalysisOutcome::Rejected(RejectionReason::Transport));

        flow.start_scanning().await.unwrap();
        flow.capture("aW1hZ2U=".to_string()).await.unwrap();

        assert_eq!(flow.banner().await.as_deref(), Some(NETWORK_BANNER));
    }

    #[tokio::test]
    async fn test_banner_clears_on_navigation() {
        let (flow, _) = flow_with(AnalysisOutcome::Rejected(RejectionReason::LowConfidence));

        flow.start_scanning().await.unwrap();
        flow.capture("eA==".to_string()).await.unwrap();
        assert!(flow.banner().await.is_some());

        flow.cancel_scanning().await.unwrap();
        assert!(flow.banner().await.is_none());
    }

    #[tokio::test]
    async fn test_capture_outside_scanning_is_refused() {
        let (flow, _) = flow_with(AnalysisOutcome::Accepted(apple_item()));
        assert_eq!(
            flow.capture("eA==".to_string()).await,
            Err(FlowError::WrongScreen(Screen::Home))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_second_capture_while_analyzing_is_refused() {
        let gate = Arc::new(Notify::new());
        let logs = Arc::new(InMemoryLogRepository::new());
        let flow = Arc::new(LogFlowUseCase::new(
            logs,
            Arc::new(InMemoryProfileRepository::new()),
            Arc::new(GatedAnalyzer {
                gate: gate.clone(),
                outcome: AnalysisOutcome::Accepted(apple_item()),
            }),
            Arc::new(SequentialIdGenerator::new()),
        ));

        flow.start_scanning().await.unwrap();

        let first = {
            let flow = flow.clone();
            tokio::spawn(async move { flow.capture("Zmlyc3Q=".to_string()).await })
        };

        // Wait until the first capture has moved the flow to Analyzing.
        while flow.screen().await != Screen::Analyzing {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            flow.capture("c2Vjb25k".to_string()).await,
            Err(FlowError::AnalysisInFlight)
        );

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(flow.screen().await, Screen::Result);
    }

    #[tokio::test]
    async fn test_discard_result_returns_to_scanning() {
        let (flow, logs) = flow_with(AnalysisOutcome::Accepted(apple_item()));

        flow.start_scanning().await.unwrap();
        flow.capture("eA==".to_string()).await.unwrap();
        flow.discard_result().await.unwrap();

        assert_eq!(flow.screen().await, Screen::Scanning);
        assert!(flow.pending_item().await.is_none());
        assert!(logs.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_weight_is_clamped_to_interactive_domain() {
        let mut item = apple_item();
        item.estimated_weight_grams = 2500.0;
        let (flow, _) = flow_with(AnalysisOutcome::Accepted(item));

        flow.start_scanning().await.unwrap();
        flow.capture("eA==".to_string()).await.unwrap();
        assert_eq!(flow.chosen_weight().await, 1000.0);

        flow.set_weight(3.0).await.unwrap();
        assert_eq!(flow.chosen_weight().await, 10.0);
    }

    #[tokio::test]
    async fn test_history_deletion() {
        let (flow, logs) = flow_with(AnalysisOutcome::Accepted(apple_item()));

        flow.start_scanning().await.unwrap();
        flow.capture("eA==".to_string()).await.unwrap();
        flow.save_entry().await.unwrap();

        let id = logs.load_all().await[0].id.clone();

        flow.open_history().await.unwrap();
        flow.delete_entry(&id).await.unwrap();
        assert!(flow.logs().await.is_empty());

        // Deleting an absent id stays a no-op.
        flow.delete_entry("missing").await.unwrap();

        flow.close_history().await.unwrap();
        assert_eq!(flow.screen().await, Screen::Home);
    }

    #[tokio::test]
    async fn test_profile_edit_round_trip() {
        let (flow, _) = flow_with(AnalysisOutcome::Rejected(RejectionReason::NotFood));

        flow.open_profile().await.unwrap();
        let mut edited = flow.profile().await;
        edited.weight_kg = 72.5;
        flow.save_profile(edited.clone()).await.unwrap();

        assert_eq!(flow.screen().await, Screen::Home);
        assert_eq!(flow.profile().await, edited);
    }
}
