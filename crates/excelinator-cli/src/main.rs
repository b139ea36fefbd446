//! Excelinator CLI
//!
//! Compare two spreadsheets, mark matches and merge by left join.

use clap::{Args, Parser, Subcommand};
use excelinator_core::{
    detect_format, read_table, select_mode, JobFile, JobReport, KeyRef, ReconcileOptions,
};
use excelinator_core::options::{
    DEFAULT_CHUNK_ROW_LIMIT, DEFAULT_CHUNK_SIZE_THRESHOLD_BYTES, DEFAULT_MATCH_MARKER,
    DEFAULT_MISMATCH_MARKER, DEFAULT_RESULT_COLUMN,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "excelinator")]
#[command(about = "Compare two spreadsheets, mark matches and merge by left join", long_about = None)]
#[command(version)]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark matches and merge two datasets
    Run(RunArgs),

    /// Run a saved job file
    Job {
        /// Path to job file (JSON)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Create a job file template
    CreateJob {
        /// Output path for the job file
        #[arg(short = 'f', long)]
        output: PathBuf,

        /// Origin dataset path to prefill
        #[arg(short, long, default_value = "origin.csv")]
        origin: PathBuf,

        /// Partner dataset path to prefill
        #[arg(short, long, default_value = "partner.csv")]
        partner: PathBuf,
    },

    /// Show the format, processing mode and columns of a dataset
    Inspect {
        /// Path to the dataset
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Left spreadsheet or dataset file path
    #[arg(short, long)]
    origin: PathBuf,

    /// Name or position of the index column in the origin spreadsheet
    #[arg(short = 'x', long)]
    origin_index: KeyRef,

    /// Right spreadsheet or dataset file path
    #[arg(short, long)]
    partner: PathBuf,

    /// Name or position of the index column in the partner file
    #[arg(short = 'y', long)]
    partner_index: KeyRef,

    /// Symbol or text to mark matches
    #[arg(short, long, default_value = DEFAULT_MATCH_MARKER)]
    match_marker: String,

    /// Symbol or text to mark mismatches
    #[arg(short = 'n', long, default_value = DEFAULT_MISMATCH_MARKER)]
    mismatch_marker: String,

    /// Name for the results column
    #[arg(short, long, default_value = DEFAULT_RESULT_COLUMN)]
    results_column: String,

    /// Columns in the partner file to be copied into the save file
    #[arg(short, long, num_args = 0..)]
    copy_columns: Vec<String>,

    /// Delete the rows that did not match in both files
    #[arg(short, long)]
    delete_mismatches: bool,

    /// Set all text fields (including the header) to uppercase
    #[arg(short, long)]
    uppercase: bool,

    /// Path to the save file
    #[arg(short = 'f', long)]
    save_file: PathBuf,

    /// Save the output file as an Excel spreadsheet
    #[arg(long)]
    xlsx: bool,

    /// Rows per chunk when the origin is read in lazy load mode
    #[arg(long, default_value_t = DEFAULT_CHUNK_ROW_LIMIT)]
    chunk_rows: usize,

    /// Origin file size in bytes from which lazy load mode is used
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE_THRESHOLD_BYTES)]
    chunk_threshold: u64,
}

impl RunArgs {
    fn into_job(self) -> JobFile {
        let options = ReconcileOptions {
            origin_key: self.origin_index,
            partner_key: self.partner_index,
            result_column: self.results_column,
            match_marker: self.match_marker,
            mismatch_marker: self.mismatch_marker,
            copy_columns: self.copy_columns,
            drop_unmatched: self.delete_mismatches,
            chunk_row_limit: self.chunk_rows,
            chunk_size_threshold_bytes: self.chunk_threshold,
        };
        JobFile {
            origin: self.origin,
            partner: self.partner,
            output: self.save_file,
            xlsx: self.xlsx,
            uppercase: self.uppercase,
            options,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> excelinator_core::Result<()> {
    match command {
        Commands::Run(args) => cmd_run(&args.into_job()),
        Commands::Job { file } => cmd_job(&file),
        Commands::CreateJob {
            output,
            origin,
            partner,
        } => cmd_create_job(&output, origin, partner),
        Commands::Inspect { file } => cmd_inspect(&file),
    }
}

fn cmd_run(job: &JobFile) -> excelinator_core::Result<()> {
    let report = job.run()?;
    print_report(&report);
    Ok(())
}

fn cmd_job(path: &PathBuf) -> excelinator_core::Result<()> {
    let job = JobFile::load(path)?;
    info!(
        "Loaded job: {} against {}",
        job.origin.display(),
        job.partner.display()
    );
    cmd_run(&job)
}

fn cmd_create_job(output: &PathBuf, origin: PathBuf, partner: PathBuf) -> excelinator_core::Result<()> {
    let mut options = ReconcileOptions::new("ID", "ID");
    options.copy_columns = vec!["ColumnName".to_string()];
    let job = JobFile::new(origin, partner, PathBuf::from("result.csv"), options);

    job.save(output)?;
    println!("Created job file: {}", output.display());
    println!();
    println!("Edit the file to configure your job, then run:");
    println!("  excelinator job --file {}", output.display());

    Ok(())
}

fn cmd_inspect(file: &PathBuf) -> excelinator_core::Result<()> {
    let format = detect_format(file)?;
    let size = std::fs::metadata(file)?.len();
    let mode = select_mode(format, size, &ReconcileOptions::default());
    let table = read_table(file, format)?;

    println!("File: {}", file.display());
    println!("Format: {}", format);
    println!("Size: {} bytes", size);
    println!("Processing mode: {}", mode);
    println!("Rows: {}", table.row_count());
    println!();
    println!("Columns ({}):", table.column_count());
    for column in &table.columns {
        println!("  {:>3}  {}", column.index, column.name);
    }

    Ok(())
}

fn print_report(report: &JobReport) {
    println!(
        "Saved {} rows x {} columns to {}",
        report.rows,
        report.columns,
        report.output.display()
    );
    println!("Processed in {} ({} chunk(s))", report.mode, report.chunks);
}
