use crate::lifecycle::MIN_TICK;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::debug;
use rand::Rng;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

const DEPLOYED_NAMES: [(&str, DeployedCategory); 5] = [
    ("Research Agent", DeployedCategory::Agent),
    ("Data Pipeline", DeployedCategory::Workflow),
    ("Support Bot", DeployedCategory::Agent),
    ("Nightly ETL 2", DeployedCategory::Workflow),
    ("Nightly ETL 10", DeployedCategory::Workflow),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployedCategory {
    Agent,
    Workflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployedStatus {
    Running,
    Paused,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceUsage {
    pub cpu: f32,
    pub memory: f32,
    pub gpu: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedProject {
    pub id: String,
    pub name: String,
    pub category: DeployedCategory,
    pub status: DeployedStatus,
    pub resources: ResourceUsage,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub progress: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub cpu: f32,
    pub memory: f32,
    pub gpu: f32,
    pub disk: f32,
    pub network: f32,
    pub sampled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub system: SystemMetrics,
    pub deployed: Vec<DeployedProject>,
}

fn percent<R: Rng>(rng: &mut R, low: f32, high: f32) -> f32 {
    (rng.gen_range(low..high) * 10.0).round() / 10.0
}

fn sample<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> MonitorSnapshot {
    let system = SystemMetrics {
        cpu: percent(rng, 5.0, 95.0),
        memory: percent(rng, 20.0, 90.0),
        gpu: percent(rng, 0.0, 100.0),
        disk: percent(rng, 40.0, 75.0),
        network: percent(rng, 0.0, 60.0),
        sampled_at: now,
    };
    let mut deployed: Vec<DeployedProject> = DEPLOYED_NAMES
        .iter()
        .enumerate()
        .map(|(i, (name, category))| {
            let status = match rng.gen_range(0..10) {
                0 => DeployedStatus::Error,
                1 | 2 => DeployedStatus::Paused,
                _ => DeployedStatus::Running,
            };
            let progress = rng.gen_range(0..=100u8);
            let estimated_completion = (status == DeployedStatus::Running && progress < 100)
                .then(|| now + ChronoDuration::minutes(rng.gen_range(5..240)));
            DeployedProject {
                id: format!("deploy-{}", i + 1),
                name: name.to_string(),
                category: *category,
                status,
                resources: ResourceUsage {
                    cpu: percent(rng, 1.0, 60.0),
                    memory: percent(rng, 5.0, 70.0),
                    gpu: percent(rng, 0.0, 80.0),
                },
                estimated_completion,
                progress,
            }
        })
        .collect();
    deployed.sort_by(|a, b| natord::compare(&a.name, &b.name));
    MonitorSnapshot { system, deployed }
}

/// Mock resource monitor; values are random and replaced wholesale on refresh.
pub struct ResourceMonitor {
    current: RwLock<MonitorSnapshot>,
}

impl ResourceMonitor {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(sample(&mut rand::thread_rng(), Utc::now())),
        }
    }

    pub fn refresh(&self) {
        let next = sample(&mut rand::thread_rng(), Utc::now());
        debug!("Monitor refreshed: cpu {:.1}%, memory {:.1}%", next.system.cpu, next.system.memory);
        match self.current.write() {
            Ok(mut current) => *current = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

pub fn spawn_refresh_loop(monitor: Arc<ResourceMonitor>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(MIN_TICK));
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            monitor.refresh();
        }
    })
}
