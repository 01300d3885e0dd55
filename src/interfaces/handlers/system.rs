use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Serialize;
use std::time::{Duration, Instant};
use sysinfo::{ProcessesToUpdate, System};

use crate::{constants::{HEALTH_CACHE_TTL, START_TIME}, AppState};

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    status: String,
    message: String,
    timestamp: String,
    uptime: String,
    database: String,
    version: String,
    memory_usage: String,
}

static CACHED_STATUS: Lazy<RwLock<Option<(Instant, HealthCheckResponse)>>> =
    Lazy::new(|| RwLock::new(None));

fn process_memory() -> String {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return "Unknown".to_string();
    };

    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    sys.process(pid).map_or("Unknown".to_string(), |p| {
        format!("{:.2} MB", p.memory() as f64 / 1024.0 / 1024.0)
    })
}

async fn build_health_response(state: &AppState) -> HealthCheckResponse {
    let now_utc = Utc::now();
    let uptime_secs = now_utc.signed_duration_since(*START_TIME).num_seconds().max(0) as u64;

    let database = match state.project_handler.check_store().await {
        Ok(()) => "Connected",
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            "Unavailable"
        }
    };

    HealthCheckResponse {
        status: "OK".to_string(),
        message: "Portfolio API is running".to_string(),
        timestamp: now_utc.to_rfc3339(),
        uptime: format_duration(Duration::from_secs(uptime_secs)).to_string(),
        database: database.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        memory_usage: process_memory(),
    }
}

/// Service health, recomputed at most once per cache period.
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    if let Some((checked_at, response)) = CACHED_STATUS.read().as_ref() {
        if checked_at.elapsed() < HEALTH_CACHE_TTL {
            return HttpResponse::Ok().json(response.clone());
        }
    }

    let response = build_health_response(&state).await;
    *CACHED_STATUS.write() = Some((Instant::now(), response.clone()));

    HttpResponse::Ok().json(response)
}
