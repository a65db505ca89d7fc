use std::{error::Error, fs, path::PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use shenti::{
    build_prompt, Assembler, AssemblerConfig, MetadataDefaults, ReportMetadata, ReviewParams,
    Reviewer, Segmenter, Strictness, WordXml,
};

#[derive(Parser, Debug)]
#[command(name = "shenti")]
#[command(about = "Turn generated exam review reports into documents and cards")]
#[command(version)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a raw report as a .docx file
    Report {
        /// Raw report text, as returned by the model
        raw: PathBuf,

        /// Exam paper the report is about, used for the header table
        #[arg(long, value_name = "FILE")]
        exam: Option<PathBuf>,

        /// Grade to show when the exam does not name one
        #[arg(long)]
        grade: Option<String>,

        /// Subject to show when the exam does not name one
        #[arg(long)]
        subject: Option<String>,

        /// Model name printed in the header table
        #[arg(long)]
        model: Option<String>,

        #[arg(long, short = 'o', value_name = "OUT.docx")]
        output: PathBuf,
    },
    /// Print a raw report split into section cards
    Cards {
        raw: PathBuf,

        /// Output cards as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the review prompt for an exam paper
    Prompt {
        #[arg(long, value_name = "FILE")]
        exam: PathBuf,

        #[arg(long, default_value = "五年級")]
        grade: String,

        #[arg(long, default_value = "數學")]
        subject: String,

        /// Units or lessons the exam covers
        #[arg(long, default_value = "全冊")]
        scope: String,

        /// 寬鬆, 標準 or 嚴格 (English names work too)
        #[arg(long, default_value = "標準")]
        strictness: Strictness,

        /// Textbook material to check the exam against
        #[arg(long, value_name = "FILE")]
        reference: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    match CliArgs::parse().command {
        Command::Report {
            raw,
            exam,
            grade,
            subject,
            model,
            output,
        } => {
            let raw = fs::read_to_string(raw)?;
            let exam = exam.map(fs::read_to_string).transpose()?.unwrap_or_default();
            let metadata = ReportMetadata::extract(&exam, &MetadataDefaults { grade, subject });

            let mut config = AssemblerConfig::default();
            if let Some(model) = model {
                config.model = model;
            }
            let reviewer = Reviewer {
                assembler: Assembler::new(config),
                segmenter: Segmenter::default(),
            };
            let review = reviewer.from_report(raw, metadata);
            let bytes = WordXml::default().to_docx(&review.document)?;
            fs::write(&output, bytes)?;
            info!("Wrote {}", output.display());

            let alerts = review.cards.iter().filter(|card| card.is_alert).count();
            println!(
                "{}: {} sections, {} flagged",
                output.display(),
                review.cards.len(),
                alerts
            );
        }
        Command::Cards { raw, json } => {
            let raw = fs::read_to_string(raw)?;
            let cards = Segmenter::default().segment(&raw);
            if json {
                println!("{}", serde_json::to_string_pretty(&cards)?);
            } else {
                for card in &cards {
                    let mark = if card.is_alert { "⚠️" } else { "  " };
                    println!("{mark} ────────\n{}\n", card.text);
                }
            }
        }
        Command::Prompt {
            exam,
            grade,
            subject,
            scope,
            strictness,
            reference,
        } => {
            let exam = fs::read_to_string(exam)?;
            let reference = reference.map(fs::read_to_string).transpose()?;
            let params = ReviewParams {
                grade,
                subject,
                scope,
                strictness,
            };
            print!("{}", build_prompt(&params, &exam, reference.as_deref()));
        }
    }
    Ok(())
}
