use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::config::WidgetConfig;
use crate::recorder::{ActivityRecorder, LogEntry, NetworkEntry};

/// Environment details attached to every report.
#[derive(Clone, Debug, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub app_version: String,
    pub screen_resolution: Option<(u32, u32)>,
    pub viewport_size: Option<(u32, u32)>,
    pub locale: Option<String>,
    pub timestamp: String,
}

impl SystemInfo {
    pub fn collect(screen: Option<(u32, u32)>, viewport: Option<(u32, u32)>) -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            screen_resolution: screen,
            viewport_size: viewport,
            locale: std::env::var("LANG").ok(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Everything the submit transport ships: description, optional flattened
/// screenshot, the activity ring buffers and system info.
pub struct ReportPayload {
    pub description: String,
    pub screenshot_png: Option<Vec<u8>>,
    pub console_logs: Vec<LogEntry>,
    pub network_requests: Vec<NetworkEntry>,
    pub system_info: SystemInfo,
}

pub fn build_payload(
    description: String,
    screenshot_png: Option<Vec<u8>>,
    recorder: &ActivityRecorder,
    system_info: SystemInfo,
) -> ReportPayload {
    ReportPayload {
        description,
        screenshot_png,
        console_logs: recorder.log_entries(),
        network_requests: recorder.network_entries(),
        system_info,
    }
}

/// Multipart POST to the configured endpoint. A failure leaves the session
/// untouched so the caller can offer a retry; the attempt itself is
/// recorded into the network ring buffer either way.
pub fn submit(
    config: &WidgetConfig,
    payload: ReportPayload,
    recorder: &ActivityRecorder,
) -> Result<()> {
    if config.api_endpoint.is_empty() {
        return Err(anyhow!("no API endpoint configured"));
    }
    if payload.description.trim().is_empty() {
        return Err(anyhow!("description is empty"));
    }

    let form = build_form(config, payload)?;

    let client = reqwest::blocking::Client::new();
    let started = Instant::now();
    let response = client.post(&config.api_endpoint).multipart(form).send();
    let duration_ms = started.elapsed().as_millis() as u64;

    match response {
        Ok(response) => {
            let status = response.status();
            recorder.record_request("POST", &config.api_endpoint, status.as_u16(), duration_ms);
            if !status.is_success() {
                return Err(anyhow!("submit rejected with HTTP {status}"));
            }
            Ok(())
        }
        Err(err) => {
            recorder.record_request("POST", &config.api_endpoint, 0, duration_ms);
            Err(err).context("cannot reach the report endpoint")
        }
    }
}

fn build_form(
    config: &WidgetConfig,
    payload: ReportPayload,
) -> Result<reqwest::blocking::multipart::Form> {
    use reqwest::blocking::multipart::{Form, Part};

    let mut form = Form::new().text("description", payload.description);

    if !config.api_key.is_empty() {
        form = form.text("apiKey", config.api_key.clone());
    }
    if !config.api_secret.is_empty() {
        form = form.text("apiSecret", config.api_secret.clone());
    }

    if let Some(png) = payload.screenshot_png {
        let part = Part::bytes(png)
            .file_name("screenshot.png")
            .mime_str("image/png")
            .context("invalid screenshot mime")?;
        form = form.part("screenshot", part);
    }

    form = form
        .text(
            "consoleLogs",
            serde_json::to_string(&payload.console_logs).context("cannot serialize logs")?,
        )
        .text(
            "networkRequests",
            serde_json::to_string(&payload.network_requests)
                .context("cannot serialize network activity")?,
        )
        .text(
            "systemInfo",
            serde_json::to_string(&payload.system_info).context("cannot serialize system info")?,
        );

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::{build_payload, submit, SystemInfo};
    use crate::config::WidgetConfig;
    use crate::recorder::ActivityRecorder;

    #[test]
    fn system_info_reports_the_running_platform() {
        let info = SystemInfo::collect(Some((1920, 1080)), None);
        assert_eq!(info.os, std::env::consts::OS);
        assert_eq!(info.screen_resolution, Some((1920, 1080)));

        let json = serde_json::to_string(&info).expect("serialize");
        assert!(json.contains("\"os\""));
    }

    #[test]
    fn submit_without_endpoint_is_rejected() {
        let recorder = ActivityRecorder::default();
        let payload = build_payload(
            "something broke".into(),
            None,
            &recorder,
            SystemInfo::collect(None, None),
        );

        let err = submit(&WidgetConfig::default(), payload, &recorder).unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn submit_requires_a_description() {
        let recorder = ActivityRecorder::default();
        let config = WidgetConfig {
            api_endpoint: "https://bugs.example/api".into(),
            ..WidgetConfig::default()
        };
        let payload = build_payload("   ".into(), None, &recorder, SystemInfo::collect(None, None));

        let err = submit(&config, payload, &recorder).unwrap_err();
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn payload_carries_recorded_activity() {
        let recorder = ActivityRecorder::default();
        recorder.record_log(log::Level::Error, "boom".into());
        recorder.record_request("GET", "https://app.example/data", 500, 40);

        let payload = build_payload(
            "it failed".into(),
            Some(vec![1, 2, 3]),
            &recorder,
            SystemInfo::collect(None, None),
        );

        assert_eq!(payload.console_logs.len(), 1);
        assert_eq!(payload.network_requests[0].status, 500);
        assert_eq!(payload.screenshot_png.as_deref(), Some(&[1u8, 2, 3][..]));
    }
}
