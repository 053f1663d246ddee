//! Quick dry-run helper: print today's reminders for a roster file without
//! sending anything or touching the delivery log.
//!
//! Usage: chores-preview [roster.csv]

use std::path::Path;
use std::process;

use reminder_module::gateway::DisabledGateway;
use reminder_module::pipeline::ChorePipeline;
use reminder_module::service::ServiceConfig;

fn main() {
    tracing_subscriber::fmt::init();

    let roster_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "chores.csv".to_string());

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    };

    let pipeline = ChorePipeline::new(
        config.composer(),
        DisabledGateway,
        config.delivery_log(),
    );

    match pipeline.run_path(Path::new(&roster_path), true, None) {
        Ok(records) => {
            for record in records {
                if let Ok(line) = serde_json::to_string(&record) {
                    println!("{}", line);
                }
            }
        }
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    }
}
