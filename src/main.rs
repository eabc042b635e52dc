use std::io::BufRead;

use clap::Parser;
use finqa::{
    config::PipelineConfig,
    error::{self, Error},
    generation::{DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS},
    pipeline::{IngestReport, ScoredChunk, Session},
    retriever::DEFAULT_TOP_K,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{
    AskArgs,
    ChatArgs,
    ChunksArgs,
    Cli,
    Command,
    GenerationArgs,
    InputArgs,
    PromptArgs,
    RetrievalArgs,
    SearchArgs,
};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("FINQA_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let chunking = (cli.max_chars, cli.overlap);
    match cli.command {
        Command::Chunks(args) => cmd_chunks(chunking, &args)?,
        Command::Search(args) => cmd_search(chunking, &args)?,
        Command::Prompt(args) => cmd_prompt(chunking, &args)?,
        Command::Ask(args) => cmd_ask(chunking, &args)?,
        Command::Chat(args) => cmd_chat(chunking, &args)?,
        Command::Completions(args) => args.generate(),
    }

    Ok(())
}

fn pipeline_config(
    (max_chars, overlap): (usize, usize),
    retrieval: Option<&RetrievalArgs>,
    generation: Option<&GenerationArgs>,
) -> error::Result<PipelineConfig> {
    PipelineConfig::from_parts(
        max_chars,
        overlap,
        retrieval.map_or(DEFAULT_TOP_K, |r| r.top_k),
        generation.map_or(DEFAULT_MODEL, |g| g.model.as_str()),
        generation.map_or(DEFAULT_TIMEOUT_SECS, |g| g.timeout),
        retrieval.and_then(|r| r.instructions.clone()),
    )
}

/// Build a session from the inputs, reporting what was skipped.
fn open_session(
    config: PipelineConfig,
    input: &InputArgs,
) -> error::Result<Session> {
    let mut session = Session::new(config);
    let report = session.ingest_paths(&input.inputs);
    print_report(&report);

    if report.documents == 0 {
        return Err(Error::NotFound {
            kind: "document",
            name: input
                .inputs
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(session)
}

fn print_report(report: &IngestReport) {
    for failure in &report.failed_documents {
        eprintln!(
            "Warning: could not load {}: {}",
            failure.source.display(),
            failure.error
        );
    }
    for skipped in &report.skipped_tables {
        eprintln!(
            "Warning: table {} skipped: {}",
            skipped.index, skipped.reason
        );
    }
    eprintln!(
        "Processed {} document(s): {} chunk(s) from {} text block(s) \
         and {} table(s)",
        report.documents,
        report.chunks,
        report.text_blocks,
        report.tables_rendered
    );
}

fn cmd_chunks(
    chunking: (usize, usize),
    args: &ChunksArgs,
) -> error::Result<()> {
    let config = pipeline_config(chunking, None, None)?;
    let session = open_session(config, &args.input)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(session.corpus())?);
    } else if session.corpus().is_empty() {
        println!("No chunks extracted.");
    } else {
        for (i, chunk) in session.corpus().iter().enumerate() {
            println!("--- chunk {i} (block {}) ---", chunk.block);
            println!("{}", chunk.content);
        }
    }
    Ok(())
}

fn cmd_search(
    chunking: (usize, usize),
    args: &SearchArgs,
) -> error::Result<()> {
    let config = pipeline_config(chunking, Some(&args.retrieval), None)?;
    let session = open_session(config, &args.input)?;
    let results = session.search(&args.query);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        format_human(&results);
    }
    Ok(())
}

fn cmd_prompt(
    chunking: (usize, usize),
    args: &PromptArgs,
) -> error::Result<()> {
    let config = pipeline_config(chunking, Some(&args.retrieval), None)?;
    let session = open_session(config, &args.input)?;
    println!("{}", session.prompt(&args.question));
    Ok(())
}

fn cmd_ask(chunking: (usize, usize), args: &AskArgs) -> error::Result<()> {
    let config = pipeline_config(
        chunking,
        Some(&args.retrieval),
        Some(&args.generation),
    )?;
    let session = open_session(config, &args.input)?;

    if args.show_context {
        format_human(&session.search(&args.question));
        println!();
    }

    let generator = args.generation.generator();
    println!("{}", session.answer(&args.question, generator.as_ref()));
    Ok(())
}

#[derive(Debug, Serialize)]
struct Exchange {
    question: String,
    answer: String,
}

fn cmd_chat(chunking: (usize, usize), args: &ChatArgs) -> error::Result<()> {
    let config = pipeline_config(
        chunking,
        Some(&args.retrieval),
        Some(&args.generation),
    )?;
    let session = open_session(config, &args.input)?;
    let generator = args.generation.generator();
    let mut history: Vec<Exchange> = Vec::new();

    eprintln!("Type a question per line; end input to finish.");
    for line in std::io::stdin().lock().lines() {
        let question = line?;
        let question = question.trim();
        if question.is_empty() {
            continue;
        }

        let answer = session.answer(question, generator.as_ref());
        println!("Q: {question}");
        println!("A: {answer}\n");
        history.push(Exchange {
            question: question.to_string(),
            answer,
        });
    }

    if let Some(path) = &args.transcript {
        std::fs::write(path, serde_json::to_string_pretty(&history)?)?;
        eprintln!(
            "Wrote {} exchange(s) to {}",
            history.len(),
            path.display()
        );
    }
    Ok(())
}

/// Format ranked chunks for terminal output.
fn format_human(results: &[ScoredChunk<'_>]) {
    if results.is_empty() {
        println!("No relevant chunks found.");
        return;
    }

    for (rank, r) in results.iter().enumerate() {
        println!(
            "{:>3}. [{:.3}] chunk {} (block {})",
            rank + 1,
            r.score,
            r.chunk_index,
            r.block
        );
        for line in r.content.lines() {
            println!("     {line}");
        }
    }
    println!("\n{} result(s)", results.len());
}
