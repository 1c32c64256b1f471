//! Gauge CLI - Command-line interface for Stress Gauge
//!
//! Commands:
//! - assess: Score a recorded session bundle into a report
//! - health: Validate and score health metrics
//! - fuse: Fuse three domain scores into a final score and stress level
//! - schema: Describe the input bundle or the output report

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stress_gauge::error::AssessmentError;
use stress_gauge::fusion::fuse;
use stress_gauge::health::HealthForm;
use stress_gauge::pipeline::{assess_bundle, SessionBundle};
use stress_gauge::report::{ReportEncoder, REPORT_VERSION};
use stress_gauge::types::Sex;
use stress_gauge::{GAUGE_VERSION, PRODUCER_NAME};

/// Gauge - multi-signal stress self-assessment scoring
#[derive(Parser)]
#[command(name = "gauge")]
#[command(version = GAUGE_VERSION)]
#[command(about = "Score stress self-assessment sessions", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a session bundle into a report
    Assess {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Validate and score health metrics
    Health {
        /// Systolic blood pressure (mmHg, 70-200)
        #[arg(long)]
        systolic: i64,

        /// Diastolic blood pressure (mmHg, 40-130)
        #[arg(long)]
        diastolic: i64,

        /// Heart rate (bpm, 40-150)
        #[arg(long)]
        heart_rate: i64,

        /// Blood sugar (mg/dL, 50-400)
        #[arg(long)]
        blood_sugar: i64,

        /// Age (years, 18-100)
        #[arg(long)]
        age: i64,

        #[arg(long, value_enum, default_value = "male")]
        sex: SexArg,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Fuse domain scores (each 0-3) into the final score
    Fuse {
        #[arg(long)]
        emotion: f64,

        #[arg(long)]
        cognitive: f64,

        #[arg(long)]
        health: f64,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum SexArg {
    Male,
    Female,
    Other,
}

impl From<SexArg> for Sex {
    fn from(sex: SexArg) -> Self {
        match sex {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
            SexArg::Other => Sex::Other,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Session bundle accepted by `assess`
    Input,
    /// Report envelope produced by `assess`
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<(), GaugeCliError> {
    match cli.command {
        Commands::Assess {
            input,
            output,
            output_format,
        } => cmd_assess(&input, &output, &output_format),

        Commands::Health {
            systolic,
            diastolic,
            heart_rate,
            blood_sugar,
            age,
            sex,
            output_format,
        } => {
            let form = HealthForm {
                systolic: Some(systolic),
                diastolic: Some(diastolic),
                heart_rate: Some(heart_rate),
                blood_sugar: Some(blood_sugar),
                age: Some(age),
                sex: sex.into(),
            };
            let result = form.submit().map_err(AssessmentError::from)?;
            println!("{}", format_output(&result, &output_format)?);
            Ok(())
        }

        Commands::Fuse {
            emotion,
            cognitive,
            health,
            output_format,
        } => {
            let scores = [("emotion", emotion), ("cognitive", cognitive), ("health", health)];
            for (name, score) in scores {
                if !(0.0..=3.0).contains(&score) {
                    return Err(GaugeCliError::ScoreOutOfRange(name, score));
                }
            }
            let outcome = fuse(emotion, cognitive, health);
            println!("{}", format_output(&outcome, &output_format)?);
            Ok(())
        }

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_assess(
    input: &Path,
    output: &Path,
    output_format: &OutputFormat,
) -> Result<(), GaugeCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            warn!("reading session bundle from the terminal; end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    if input_data.trim().is_empty() {
        return Err(GaugeCliError::EmptyInput);
    }

    let bundle: SessionBundle = serde_json::from_str(&input_data)?;
    let report = assess_bundle(bundle)?;
    let envelope = ReportEncoder::new().encode(&report);
    info!(session = %report.session_id, stress_level = %report.stress_level, "session assessed");

    let output_data = format_output(&envelope, output_format)?;
    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data + "\n")?;
    }

    Ok(())
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), GaugeCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input: session bundle");
                println!();
                println!("- personal (optional): {{ first_name, last_name, email, date_of_birth, gender,");
                println!("    phone?, medical_issues?, medical_history?, location? }}");
                println!("- emotion_response: classifier body, or null if no frame was classified");
                println!("    {{ dominant_emotion, confidence (0-100), emotions: {{ label: percent }} }}");
                println!("    or {{ error }} (session stops in the emotion phase)");
                println!("- cognitive:");
                println!("    reaction_ms: 5 valid reaction times (ms)");
                println!("    memory: {{ moves, elapsed_seconds }}");
                println!("    one_back: {{ correct }} out of 19");
                println!("    attention: {{ correct, latencies_ms }} over 15 trials");
                println!("- health: {{ systolic 70-200, diastolic 40-130, heart_rate 40-150,");
                println!("    blood_sugar 50-400, age 18-100, sex: male|female|other }}");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: report envelope {}", REPORT_VERSION);
                println!();
                println!("- report_version");
                println!("- producer: {{ name: {}, version, instance_id }}", PRODUCER_NAME);
                println!("- computed_at_utc");
                println!("- report:");
                println!("  - session_id, generated_at, personal_details?");
                println!("  - emotion_score, cognitive_score, health_score (each 0-3)");
                println!("  - final_score = 0.40 emotion + 0.35 cognitive + 0.25 health");
                println!("  - stress_level: Normal (<1.0) | Mild (<2.0) | Moderate (<2.5) | Severe");
                println!("  - emotion, cognitive {{ tests, cognitive_score }}, health");
                println!("  - recommendations: [{{ title, description, priority }}], summary");
            }
        }
    }

    Ok(())
}

// Helper functions

fn format_output<T: serde::Serialize>(
    value: &T,
    format: &OutputFormat,
) -> Result<String, GaugeCliError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    })
}

fn get_input_json_schema() -> String {
    let health_field = |min: i64, max: i64| {
        serde_json::json!({ "type": "integer", "minimum": min, "maximum": max })
    };
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "stress-gauge session bundle",
        "type": "object",
        "required": ["cognitive", "health"],
        "properties": {
            "personal": {
                "type": "object",
                "required": ["first_name", "last_name", "email", "date_of_birth", "gender"],
                "properties": {
                    "first_name": { "type": "string" },
                    "last_name": { "type": "string" },
                    "email": { "type": "string" },
                    "phone": { "type": "string" },
                    "date_of_birth": { "type": "string" },
                    "gender": { "type": "string" },
                    "medical_issues": { "type": "string" },
                    "medical_history": { "type": "string" },
                    "location": { "type": "string" }
                }
            },
            "emotion_response": {
                "oneOf": [
                    { "type": "null" },
                    {
                        "type": "object",
                        "required": ["dominant_emotion", "confidence"],
                        "properties": {
                            "dominant_emotion": { "type": "string" },
                            "confidence": { "type": "number", "minimum": 0, "maximum": 100 },
                            "emotions": { "type": "object", "additionalProperties": { "type": "number" } }
                        }
                    },
                    {
                        "type": "object",
                        "required": ["error"],
                        "properties": { "error": { "type": "string" } }
                    }
                ]
            },
            "cognitive": {
                "type": "object",
                "required": ["reaction_ms", "memory", "one_back", "attention"],
                "properties": {
                    "reaction_ms": { "type": "array", "items": { "type": "integer" }, "minItems": 5, "maxItems": 5 },
                    "memory": {
                        "type": "object",
                        "required": ["moves", "elapsed_seconds"],
                        "properties": {
                            "moves": { "type": "integer", "minimum": 8 },
                            "elapsed_seconds": { "type": "integer", "minimum": 0 }
                        }
                    },
                    "one_back": {
                        "type": "object",
                        "required": ["correct"],
                        "properties": { "correct": { "type": "integer", "minimum": 0, "maximum": 19 } }
                    },
                    "attention": {
                        "type": "object",
                        "required": ["correct", "latencies_ms"],
                        "properties": {
                            "correct": { "type": "integer", "minimum": 0, "maximum": 15 },
                            "latencies_ms": { "type": "array", "items": { "type": "integer" }, "minItems": 15, "maxItems": 15 }
                        }
                    }
                }
            },
            "health": {
                "type": "object",
                "required": ["systolic", "diastolic", "heart_rate", "blood_sugar", "age"],
                "properties": {
                    "systolic": health_field(70, 200),
                    "diastolic": health_field(40, 130),
                    "heart_rate": health_field(40, 150),
                    "blood_sugar": health_field(50, 400),
                    "age": health_field(18, 100),
                    "sex": { "type": "string", "enum": ["male", "female", "other"] }
                }
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    let score = serde_json::json!({ "type": "number", "minimum": 0, "maximum": 3 });
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "stress-gauge report envelope",
        "type": "object",
        "required": ["report_version", "producer", "computed_at_utc", "report"],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "report": {
                "type": "object",
                "required": [
                    "session_id", "generated_at", "emotion_score", "cognitive_score",
                    "health_score", "final_score", "stress_level", "cognitive", "health",
                    "recommendations", "summary"
                ],
                "properties": {
                    "session_id": { "type": "string", "format": "uuid" },
                    "generated_at": { "type": "string", "format": "date-time" },
                    "emotion_score": score.clone(),
                    "cognitive_score": score.clone(),
                    "health_score": score.clone(),
                    "final_score": score.clone(),
                    "stress_level": { "type": "string", "enum": ["Normal", "Mild", "Moderate", "Severe"] },
                    "emotion": { "type": ["object", "null"] },
                    "cognitive": { "type": "object" },
                    "health": { "type": "object" },
                    "recommendations": {
                        "type": "array",
                        "maxItems": 6,
                        "items": {
                            "type": "object",
                            "properties": {
                                "title": { "type": "string" },
                                "description": { "type": "string" },
                                "priority": { "type": "string", "enum": ["high", "medium", "low"] }
                            }
                        }
                    },
                    "summary": { "type": "string" }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum GaugeCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Assessment(AssessmentError),
    ScoreOutOfRange(&'static str, f64),
    EmptyInput,
}

impl From<io::Error> for GaugeCliError {
    fn from(e: io::Error) -> Self {
        GaugeCliError::Io(e)
    }
}

impl From<serde_json::Error> for GaugeCliError {
    fn from(e: serde_json::Error) -> Self {
        GaugeCliError::Json(e)
    }
}

impl From<AssessmentError> for GaugeCliError {
    fn from(e: AssessmentError) -> Self {
        GaugeCliError::Assessment(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GaugeCliError> for CliError {
    fn from(e: GaugeCliError) -> Self {
        match e {
            GaugeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GaugeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'gauge schema input' for the expected shape".to_string()),
            },
            GaugeCliError::ScoreOutOfRange(name, value) => CliError {
                code: "SCORE_OUT_OF_RANGE".to_string(),
                message: format!("{name} score {value} is outside 0-3"),
                hint: None,
            },
            GaugeCliError::EmptyInput => CliError {
                code: "EMPTY_INPUT".to_string(),
                message: "No session bundle found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            GaugeCliError::Assessment(e) => {
                let (code, hint) = match &e {
                    AssessmentError::JsonError(_) => {
                        ("JSON_ERROR", Some("Run 'gauge schema input' for the expected shape"))
                    }
                    AssessmentError::Validation(_) => {
                        ("VALIDATION_ERROR", Some("Correct the highlighted field and resubmit"))
                    }
                    AssessmentError::Classifier(_) => (
                        "CLASSIFIER_ERROR",
                        Some("Emotion capture failed; retry the capture or pass null to skip it"),
                    ),
                    AssessmentError::IncompleteCognitive(_) | AssessmentError::InvalidTrial(_) => {
                        ("COGNITIVE_ERROR", Some("Check the cognitive metric counts"))
                    }
                    AssessmentError::InvalidTransition { .. } => ("TRANSITION_ERROR", None),
                    AssessmentError::Assistant(_) => ("ASSISTANT_ERROR", None),
                    AssessmentError::EncodingError(_) => ("ENCODING_ERROR", None),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: hint.map(str::to_string),
                }
            }
        }
    }
}
