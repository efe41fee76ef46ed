//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use namevault_core::Resource;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single resource with all its records
    pub fn print_resource(&self, resource: &Resource) {
        match self.format {
            OutputFormat::Human => {
                println!("{}", resource.domain);
                for record in &resource.records {
                    println!(
                        "  {:<6} {:<4} {:<6} {}",
                        record.ttl, record.class, record.rtype, record.address
                    );
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(resource).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", resource.domain);
            }
        }
    }

    /// Print the full record listing
    pub fn print_resources(&self, resources: &[Resource]) {
        match self.format {
            OutputFormat::Human => {
                if resources.is_empty() {
                    println!("No records stored.");
                    return;
                }
                for resource in resources {
                    for record in &resource.records {
                        println!(
                            "{:<30} {:<6} {:<4} {:<6} {}",
                            resource.domain, record.ttl, record.class, record.rtype, record.address
                        );
                    }
                }
                println!("\n{} domain(s)", resources.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(resources).unwrap());
            }
            OutputFormat::Quiet => {
                for resource in resources {
                    println!("{}", resource.domain);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}
