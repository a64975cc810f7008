use std::io::IsTerminal;

use bhanotify_listener::{FrameOutcome, Notification};
use chrono::{DateTime, SecondsFormat};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EventOutput<'a> {
    schema_id: &'a str,
    event: &'a str,
    event_code: &'a str,
    intercom_id: &'a str,
    timestamp: u32,
    time: String,
    port: u16,
    source: String,
}

#[derive(Serialize)]
struct DropOutput<'a> {
    schema_id: &'a str,
    outcome: &'a str,
    reason: String,
}

#[derive(Serialize)]
struct FrameHexOutput<'a> {
    schema_id: &'a str,
    frame: &'a str,
    length: usize,
    sent_to: Option<String>,
}

pub fn print_notification(n: &Notification, format: OutputFormat) {
    let time = format_timestamp(n.kind.timestamp());
    match format {
        OutputFormat::Json => {
            let out = EventOutput {
                schema_id: "https://schemas.bhanotify.dev/cli/v1/event.schema.json",
                event: n.kind.name(),
                event_code: &n.event.event_code,
                intercom_id: &n.event.intercom_id,
                timestamp: n.kind.timestamp(),
                time,
                port: n.port,
                source: n.source.to_string(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "TIME", "INTERCOM", "PORT", "SOURCE"])
                .add_row(vec![
                    n.kind.name().to_string(),
                    time,
                    n.event.intercom_id.clone(),
                    n.port.to_string(),
                    n.source.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "event={} time={} intercom={} port={} source={}",
                n.kind.name(),
                time,
                n.event.intercom_id,
                n.port,
                n.source
            );
        }
    }
}

/// Print the result of decoding a single frame.
pub fn print_outcome(outcome: &FrameOutcome, format: OutputFormat) {
    let reason = match outcome {
        FrameOutcome::Delivered(n) => return print_notification(n, format),
        FrameOutcome::Rejected(r) => r.to_string(),
        FrameOutcome::Duplicate => "duplicate frame".to_string(),
        FrameOutcome::DecryptFailed(f) => f.to_string(),
        FrameOutcome::ParseFailed(f) => f.to_string(),
    };

    match format {
        OutputFormat::Json => {
            let out = DropOutput {
                schema_id: "https://schemas.bhanotify.dev/cli/v1/frame-dropped.schema.json",
                outcome: outcome.label(),
                reason,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OUTCOME", "REASON"])
                .add_row(vec![outcome.label().to_string(), reason]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("dropped={} reason={}", outcome.label(), reason);
        }
    }
}

pub fn print_frame_hex(frame: &[u8], sent_to: Option<String>, format: OutputFormat) {
    let encoded = hex::encode(frame);
    match format {
        OutputFormat::Json => {
            let out = FrameHexOutput {
                schema_id: "https://schemas.bhanotify.dev/cli/v1/sealed-frame.schema.json",
                frame: &encoded,
                length: frame.len(),
                sent_to,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "LENGTH", "SENT TO"])
                .add_row(vec![
                    encoded,
                    frame.len().to_string(),
                    sent_to.unwrap_or_else(|| "-".to_string()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match sent_to {
            Some(target) => println!("{encoded} -> {target}"),
            None => println!("{encoded}"),
        },
    }
}

/// Device timestamps as RFC 3339 in UTC.
pub fn format_timestamp(timestamp: u32) -> String {
    DateTime::from_timestamp(i64::from(timestamp), 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| timestamp.to_string())
}
