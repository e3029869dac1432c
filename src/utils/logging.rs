// Logging utilities
// Structured logging with JSON and human-readable formats, plus masking of
// personal identifiers before they reach a log line.

use log::Level;
use serde_json::json;
use std::collections::HashMap;

/// Mask a sensitive value, keeping only a short prefix/suffix visible.
pub fn mask_sensitive(input: &str) -> String {
    if input.len() <= 8 {
        return "***".to_string();
    }

    let visible = 4;
    let start = &input[..visible.min(input.len())];
    let end = &input[input.len().saturating_sub(visible)..];

    format!("{}...{}", start, end)
}

/// Mask a national identity number: only the last 4 characters stay visible.
/// Handles both the old (9 digits + letter) and new (12 digit) formats, and
/// degrades to full masking for anything shorter than 5 characters.
pub fn mask_national_id(nic: &str) -> String {
    let s = nic.trim();
    if s.is_empty() {
        return String::new();
    }
    if s.len() <= 4 {
        return "***".to_string();
    }
    let tail = &s[s.len() - 4..];
    format!("{}{}", "*".repeat(s.len() - 4), tail)
}

/// Mask a phone number, keeping the last 3 digits for troubleshooting.
pub fn mask_phone(phone: &str) -> String {
    let s = phone.trim();
    if s.is_empty() {
        return String::new();
    }
    if s.len() <= 3 {
        return "***".to_string();
    }
    let tail = &s[s.len() - 3..];
    format!("{}{}", "*".repeat(s.len() - 3), tail)
}

/// Parse phase and step from log message
/// Extracts [PHASE: ...] and [STEP: ...] patterns
pub fn parse_log_metadata(message: &str) -> (Option<String>, Option<String>, String) {
    let mut phase = None;
    let mut step = None;
    let mut cleaned_message = message.to_string();

    // Extract [PHASE: ...]
    if let Some(start) = message.find("[PHASE:") {
        if let Some(end) = message[start..].find(']') {
            let phase_str = &message[start + 7..start + end].trim();
            phase = Some(phase_str.to_string());
            cleaned_message = format!("{} {}", &message[..start], &message[start + end + 1..])
                .trim()
                .to_string();
        }
    }

    // Extract [STEP: ...]
    if let Some(start) = cleaned_message.find("[STEP:") {
        if let Some(end) = cleaned_message[start..].find(']') {
            let step_str = &cleaned_message[start + 6..start + end].trim();
            step = Some(step_str.to_string());
            cleaned_message = format!(
                "{} {}",
                &cleaned_message[..start],
                &cleaned_message[start + end + 1..]
            )
            .trim()
            .to_string();
        }
    }

    (phase, step, cleaned_message)
}

/// Format log entry as JSON for structured logging
pub fn format_json_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
    details: Option<&HashMap<String, serde_json::Value>>,
) -> String {
    let mut log_entry = json!({
        "timestamp": timestamp,
        "level": level.as_str(),
        "target": target,
        "message": message,
    });

    if let Some(phase) = phase {
        log_entry["phase"] = json!(phase);
    }

    if let Some(step) = step {
        log_entry["step"] = json!(step);
    }

    if let Some(details) = details {
        log_entry["details"] = json!(details);
    }

    serde_json::to_string(&log_entry).unwrap_or_else(|_| "{}".to_string())
}

/// Format log entry as human-readable text
pub fn format_human_readable_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_line = format!("[{}] [{}]", timestamp, level.as_str());

    if let Some(phase) = phase {
        log_line.push_str(&format!(" [PHASE: {}]", phase));
    }

    if let Some(step) = step {
        log_line.push_str(&format!(" [STEP: {}]", step));
    }

    log_line.push_str(&format!(" [{}] {}", target, message));
    log_line
}

/// Initialize dual-format logging: JSON lines to a .log file and
/// human-readable lines to a .txt file, with optional stdout echo.
pub fn init_logging(
    log_dir: &std::path::Path,
    with_stdout: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");
    let json_log_file = log_dir.join(format!("registry-intake-{}.log", timestamp));
    let txt_log_file = log_dir.join(format!("registry-intake-{}.txt", timestamp));

    let mut dispatch = fern::Dispatch::new().level(log::LevelFilter::Debug);

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) = parse_log_metadata(&message_str);
                    let txt_line = format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) = parse_log_metadata(&message_str);
                    let json_line = format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                        None,
                    );
                    out.finish(format_args!("{}\n", json_line));
                })
                .chain(fern::log_file(&json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) = parse_log_metadata(&message_str);
                    let txt_line = format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", txt_line));
                })
                .chain(fern::log_file(&txt_log_file)?),
        );

    dispatch.apply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Personal-identifier masking (no applicant data leaks into logs)
    // -------------------------------------------------------------------------

    #[test]
    fn mask_national_id_keeps_last_four() {
        let masked = mask_national_id("911042754V");
        assert!(masked.ends_with("754V"), "Last 4 visible: {}", masked);
        assert!(
            !masked.contains("911042"),
            "Leading digits must be masked: {}",
            masked
        );
    }

    #[test]
    fn mask_national_id_new_format() {
        let masked = mask_national_id("199110427541");
        assert_eq!(masked.len(), 12);
        assert!(masked.starts_with("********"), "Masked prefix: {}", masked);
        assert!(masked.ends_with("7541"));
    }

    #[test]
    fn mask_national_id_short_and_empty() {
        assert_eq!(mask_national_id(""), "");
        assert_eq!(mask_national_id("123"), "***");
    }

    #[test]
    fn mask_phone_keeps_last_three() {
        let masked = mask_phone("0712345678");
        assert!(masked.ends_with("678"), "Last 3 visible: {}", masked);
        assert!(
            !masked.contains("0712345"),
            "Leading digits must be masked: {}",
            masked
        );
    }

    #[test]
    fn mask_sensitive_short_values_fully_masked() {
        assert_eq!(mask_sensitive("abc"), "***");
        assert_eq!(mask_sensitive("12345678"), "***");
    }

    #[test]
    fn mask_sensitive_long_values_partially_masked() {
        let masked = mask_sensitive("abcdefghijklmnop");
        assert!(masked.contains("..."), "Partially masked: {}", masked);
        assert!(masked.starts_with("abcd"));
        assert!(masked.ends_with("mnop"));
    }

    // -------------------------------------------------------------------------
    // Phase/step metadata extraction and formatting
    // -------------------------------------------------------------------------

    #[test]
    fn parse_log_metadata_extracts_phase_and_step() {
        let (phase, step, cleaned) =
            parse_log_metadata("[PHASE: wizard] [STEP: next] advanced to step 2");
        assert_eq!(phase.as_deref(), Some("wizard"));
        assert_eq!(step.as_deref(), Some("next"));
        assert_eq!(cleaned, "advanced to step 2");
    }

    #[test]
    fn parse_log_metadata_without_markers_is_passthrough() {
        let (phase, step, cleaned) = parse_log_metadata("plain message");
        assert!(phase.is_none() && step.is_none());
        assert_eq!(cleaned, "plain message");
    }

    #[test]
    fn json_log_line_is_valid_json_with_metadata() {
        let line = format_json_log(
            "2025-06-15T10:00:00Z",
            Level::Info,
            "registry_intake::wizard",
            "advanced",
            Some("wizard"),
            Some("next"),
            None,
        );
        let parsed: serde_json::Value = serde_json::from_str(&line).expect("valid JSON");
        assert_eq!(parsed["phase"], "wizard");
        assert_eq!(parsed["step"], "next");
        assert_eq!(parsed["message"], "advanced");
    }

    #[test]
    fn human_readable_line_carries_markers() {
        let line = format_human_readable_log(
            "2025-06-15 10:00:00.000",
            Level::Warn,
            "registry_intake::submission",
            "discarding malformed rows",
            Some("submission"),
            Some("sub_table"),
        );
        assert!(line.contains("[PHASE: submission]"));
        assert!(line.contains("[STEP: sub_table]"));
        assert!(line.contains("discarding malformed rows"));
    }

    #[test]
    fn init_logging_creates_both_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        // apply() may fail if another test initialized the global logger
        // first; file creation is what this test locks down.
        let _ = init_logging(dir.path(), false);
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert!(
            names.iter().any(|n| n.ends_with(".log")) && names.iter().any(|n| n.ends_with(".txt")),
            "Both log files should exist: {:?}",
            names
        );
    }
}
