//! The `fieldgrade init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("fieldgrade.toml").exists() {
        println!("fieldgrade.toml already exists, skipping.");
    } else {
        std::fs::write("fieldgrade.toml", SAMPLE_CONFIG)?;
        println!("Created fieldgrade.toml");
    }

    std::fs::create_dir_all("exercises")?;
    let example_path = std::path::Path::new("exercises/example.toml");
    if example_path.exists() {
        println!("exercises/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_EXERCISE)?;
        println!("Created exercises/example.toml");
    }

    let submissions_path = std::path::Path::new("exercises/example-submissions.json");
    if submissions_path.exists() {
        println!("exercises/example-submissions.json already exists, skipping.");
    } else {
        std::fs::write(submissions_path, EXAMPLE_SUBMISSIONS)?;
        println!("Created exercises/example-submissions.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit exercises/example.toml to describe your exercise");
    println!("  2. Run: fieldgrade validate --exercise exercises/example.toml");
    println!("  3. Run: fieldgrade grade --exercise exercises/example.toml --submissions exercises/example-submissions.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# fieldgrade configuration

output_dir = "./fieldgrade-results"
default_format = "text"

# Keys whose statistics add up across teams when several submission files are graded
summable_keys = []
"#;

const EXAMPLE_EXERCISE: &str = r#"[exercise]
id = "example"
name = "Example Check-in"
description = "A weekly check-in message to get started"
summable_keys = ["callsign"]

[[rules]]
key = "callsign"
label = "Callsign"
type = "REQUIRED"
points = 10

[[rules]]
key = "date"
label = "Date/Time"
type = "DATE_TIME_NOT"
placeholder = "UNKNOWN"
points = 5

[[rules]]
key = "precedence"
label = "Precedence"
type = "SPECIFIED"
placeholder = "ROUTINE"
points = 2

[[rules]]
key = "comments"
label = "Comments"
type = "OPTIONAL"
points = 1

[[entries]]
key = "to"
label = "To must be #EV"
points = 2
expected = "NET CONTROL"
"#;

const EXAMPLE_SUBMISSIONS: &str = r#"[
  {
    "id": "msg-001",
    "fields": {
      "callsign": "K1ABC",
      "date": "2024-06-22 18:00",
      "precedence": "Routine",
      "to": "Net Control",
      "comments": null
    }
  },
  {
    "id": "msg-002",
    "fields": {
      "callsign": "W1AW",
      "date": "UNKNOWN",
      "precedence": "PRIORITY",
      "to": "W1AW"
    }
  }
]
"#;
