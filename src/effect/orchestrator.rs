//! Alarm effect orchestration.
//!
//! This module provides the [`EffectOrchestrator`], which drives every light
//! through the alarm script when a relevant alert is detected:
//!
//! ```text
//! Idle → Capturing → Blinking(1..=n) → Dwelling → Restoring → Done
//! ```
//!
//! Each light runs its script on its own task. Steps within a script are strictly
//! sequential, scripts of different lights are not ordered. A failing step is
//! logged and recorded in the [`EffectReport`], then the script carries on with
//! the next step. Nothing is rolled back.

use std::{collections::BTreeMap, fmt, sync::Arc};

use futures::future::join_all;
use log::{debug, error, info, warn};
#[cfg(test)]
use mockall::automock;
use tokio::{task::JoinHandle, time};

use crate::{
    alerts::Alert,
    effect::{EffectPlan, WledStrip},
    hue::{DeviceRegistry, HueError, LightState},
};

/// Light states captured at the start of a run, keyed by light id.
pub type DeviceSnapshot = BTreeMap<String, LightState>;

/// Step of a light script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DevicePhase {
    /// Not started
    Idle,
    /// Reading the state to restore
    Capturing,
    /// Blink cycle number `n`, starting at 1
    Blinking(u8),
    /// Holding the alarm state
    Dwelling,
    /// Writing back the captured state
    Restoring,
    /// Script over, whatever the outcome of its steps
    Done,
}

impl fmt::Display for DevicePhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DevicePhase::Idle => write!(f, "idle"),
            DevicePhase::Capturing => write!(f, "capturing"),
            DevicePhase::Blinking(n) => write!(f, "blinking #{}", n),
            DevicePhase::Dwelling => write!(f, "dwelling"),
            DevicePhase::Restoring => write!(f, "restoring"),
            DevicePhase::Done => write!(f, "done"),
        }
    }
}

/// A step that failed on a light.
#[derive(Clone, Debug, PartialEq)]
pub struct StepFailure {
    pub phase: DevicePhase,
    pub error: String,
}

/// Result of one light script.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceOutcome {
    /// Bridge light id
    pub device_id: String,
    /// State restored at the end of the script
    pub captured: Option<LightState>,
    /// Last phase reached
    pub phase: DevicePhase,
    /// Failed steps, in order
    pub failures: Vec<StepFailure>,
}

impl DeviceOutcome {
    fn new(device_id: String) -> Self {
        DeviceOutcome {
            device_id,
            captured: None,
            phase: DevicePhase::Idle,
            failures: vec![],
        }
    }

    /// Whether the script completed and its restore write succeeded.
    pub fn restored(&self) -> bool {
        self.phase == DevicePhase::Done
            && !self
                .failures
                .iter()
                .any(|failure| failure.phase == DevicePhase::Restoring)
    }
}

/// Result of one effect run.
#[derive(Clone, Debug, Default)]
pub struct EffectReport {
    /// Label of the alert that triggered the run
    pub alert: String,
    /// One outcome per light, in light id order
    pub devices: Vec<DeviceOutcome>,
    /// Failed requests to the WLED strip
    pub strip_failures: usize,
}

impl EffectReport {
    /// States the run captured and tried to restore.
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.devices
            .iter()
            .filter_map(|outcome| {
                let captured = outcome.captured.clone()?;
                Some((outcome.device_id.clone(), captured))
            })
            .collect()
    }

    fn log(&self) {
        let restored = self.devices.iter().filter(|d| d.restored()).count();
        info!(
            "alert {}: alarm effect done, {}/{} lights restored",
            self.alert,
            restored,
            self.devices.len()
        );
        debug!("alert {}: captured states {:?}", self.alert, self.snapshot());

        for outcome in self.devices.iter().filter(|d| !d.failures.is_empty()) {
            warn!(
                "alert {}: light {} had {} failed steps: {:?}",
                self.alert,
                outcome.device_id,
                outcome.failures.len(),
                outcome.failures
            );
        }
        if self.strip_failures > 0 {
            warn!(
                "alert {}: {} requests to the led strip failed",
                self.alert, self.strip_failures
            );
        }
    }
}

/// Starts the alarm effect for an alert without waiting for it.
#[cfg_attr(test, automock)]
pub trait EffectTrigger {
    /// Spawns an effect run for `alert` and returns immediately.
    fn trigger(&self, alert: &Alert);
}

/// Drives every light of a [`DeviceRegistry`] through an [`EffectPlan`].
///
/// Runs are independent: each owns the snapshot it captured, so a run started
/// while another is in progress simply overlaps it. Concurrent writes to the same
/// light are last-writer-wins.
///
/// # Examples
///
/// ```no_run
/// let bridge = HueBridge::new("192.168.1.20", "bridge-username");
/// let orchestrator = EffectOrchestrator::new(bridge, EffectPlan::default());
///
/// // Fire and forget
/// orchestrator.trigger(&alert);
///
/// // Or wait for the report
/// let report = orchestrator.run(&alert.label()).await;
/// ```
pub struct EffectOrchestrator<R: DeviceRegistry> {
    registry: Arc<R>,
    plan: Arc<EffectPlan>,
    strip: Option<Arc<WledStrip>>,
}

impl<R: DeviceRegistry> Clone for EffectOrchestrator<R> {
    fn clone(&self) -> Self {
        EffectOrchestrator {
            registry: Arc::clone(&self.registry),
            plan: Arc::clone(&self.plan),
            strip: self.strip.clone(),
        }
    }
}

impl<R: DeviceRegistry> EffectOrchestrator<R> {
    pub fn new(registry: R, plan: EffectPlan) -> Self {
        EffectOrchestrator {
            registry: Arc::new(registry),
            plan: Arc::new(plan),
            strip: None,
        }
    }

    /// Blinks `strip` along the lights on every run.
    pub fn with_strip(mut self, strip: WledStrip) -> Self {
        self.strip = Some(Arc::new(strip));
        self
    }

    /// Spawns a detached run, the handle yields its report.
    pub fn spawn(&self, alert: &Alert) -> JoinHandle<EffectReport> {
        let orchestrator = self.clone();
        let label = alert.label();
        tokio::spawn(async move { orchestrator.run(&label).await })
    }

    /// Runs the effect on every light and waits for all scripts to finish.
    ///
    /// When the lights cannot be listed the run ends immediately with an empty
    /// report.
    pub async fn run(&self, alert: &str) -> EffectReport {
        let mut report = EffectReport {
            alert: alert.to_owned(),
            ..EffectReport::default()
        };

        let devices = match self.registry.list_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                error!("alert {}: cannot list lights, effect skipped: {}", alert, e);
                return report;
            }
        };

        info!(
            "alert {}: running alarm effect on {} lights",
            alert,
            devices.len()
        );

        let strip = self.strip.as_ref().map(|strip| {
            tokio::spawn(blink_strip(
                Arc::clone(strip),
                Arc::clone(&self.plan),
                alert.to_owned(),
            ))
        });

        let (ids, scripts): (Vec<String>, Vec<JoinHandle<DeviceOutcome>>) = devices
            .into_iter()
            .map(|device| {
                let script = DeviceScript {
                    registry: Arc::clone(&self.registry),
                    plan: Arc::clone(&self.plan),
                    alert: alert.to_owned(),
                    outcome: DeviceOutcome::new(device.id.clone()),
                };
                (device.id, tokio::spawn(script.run(device.state)))
            })
            .unzip();

        let results = join_all(scripts).await;

        report.devices = ids
            .into_iter()
            .zip(results)
            .map(|(device_id, result)| match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        "alert {}: script of light {} aborted: {}",
                        alert, device_id, e
                    );
                    let mut outcome = DeviceOutcome::new(device_id);
                    outcome.failures.push(StepFailure {
                        phase: DevicePhase::Idle,
                        error: e.to_string(),
                    });
                    outcome
                }
            })
            .collect();

        if let Some(strip) = strip {
            report.strip_failures = strip.await.unwrap_or_else(|e| {
                error!("alert {}: led strip script aborted: {}", alert, e);
                1
            });
        }

        report
    }
}

impl<R: DeviceRegistry> EffectTrigger for EffectOrchestrator<R> {
    fn trigger(&self, alert: &Alert) {
        let label = alert.label();
        let run = self.spawn(alert);

        // Watch the run so a panic does not go unnoticed
        tokio::spawn(async move {
            match run.await {
                Ok(report) => report.log(),
                Err(e) => error!("alert {}: alarm effect failed: {}", label, e),
            }
        });
    }
}

/// Script of a single light.
struct DeviceScript<R: DeviceRegistry> {
    registry: Arc<R>,
    plan: Arc<EffectPlan>,
    alert: String,
    outcome: DeviceOutcome,
}

impl<R: DeviceRegistry> DeviceScript<R> {
    /// Runs every step, `listed` is the state to restore if capturing fails.
    async fn run(mut self, listed: LightState) -> DeviceOutcome {
        let plan = Arc::clone(&self.plan);

        self.enter(DevicePhase::Capturing);
        let read = self
            .registry
            .get_visible_state(&self.outcome.device_id)
            .await;
        let captured = match read {
            Ok(state) => state,
            Err(e) => {
                self.record(e);
                listed
            }
        };
        self.outcome.captured = Some(captured.clone());

        for n in 1..=plan.blinks {
            self.enter(DevicePhase::Blinking(n));
            self.apply(&plan.alarm).await;
            time::sleep(plan.blink_interval).await;
            self.apply(&plan.secondary).await;
            time::sleep(plan.blink_interval).await;
        }

        self.enter(DevicePhase::Dwelling);
        time::sleep(plan.dwell).await;

        self.enter(DevicePhase::Restoring);
        self.apply(&captured).await;

        self.enter(DevicePhase::Done);
        self.outcome
    }

    fn enter(&mut self, phase: DevicePhase) {
        debug!(
            "alert {}: light {} {}",
            self.alert, self.outcome.device_id, phase
        );
        self.outcome.phase = phase;
    }

    async fn apply(&mut self, state: &LightState) {
        let result = self
            .registry
            .set_state(&self.outcome.device_id, state)
            .await;
        if let Err(e) = result {
            self.record(e);
        }
    }

    fn record(&mut self, error: HueError) {
        warn!(
            "alert {}: light {} failed while {}: {}",
            self.alert, self.outcome.device_id, self.outcome.phase, error
        );
        self.outcome.failures.push(StepFailure {
            phase: self.outcome.phase,
            error: error.to_string(),
        });
    }
}

/// Blinks the led strip in step with the lights, returns the number of failed requests.
async fn blink_strip(strip: Arc<WledStrip>, plan: Arc<EffectPlan>, alert: String) -> usize {
    let mut failures = 0;

    for _ in 0..plan.blinks {
        for brightness in [0, 255] {
            if let Err(e) = strip.set_red(brightness).await {
                warn!("alert {}: led strip failed: {}", alert, e);
                failures += 1;
            }
            time::sleep(plan.blink_interval).await;
        }
    }

    failures
}
