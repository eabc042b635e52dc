use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use finqa::{
    chunking::{DEFAULT_MAX_CHARS, DEFAULT_OVERLAP},
    generation::{
        DEFAULT_MODEL,
        DEFAULT_OLLAMA_URL,
        DEFAULT_TIMEOUT_SECS,
        Generator,
        OllamaCli,
        OllamaHttp,
    },
    retriever::DEFAULT_TOP_K,
};

#[derive(Debug, Parser)]
#[command(
    name = "finqa",
    about = "Ask questions about extracted financial documents"
)]
pub struct Cli {
    /// Maximum chunk length in characters
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CHARS)]
    pub max_chars: usize,

    /// Characters shared by consecutive chunks of one block
    #[arg(long, global = true, default_value_t = DEFAULT_OVERLAP)]
    pub overlap: usize,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the chunk corpus built from the inputs
    Chunks(ChunksArgs),
    /// Rank chunks against a query without calling a model
    Search(SearchArgs),
    /// Print the prompt that would be sent for a question
    Prompt(PromptArgs),
    /// Answer a question with the generation backend
    Ask(AskArgs),
    /// Answer questions read line by line from stdin
    Chat(ChatArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Shared argument groups --

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Extraction file (.json, .txt, .md) or directory; repeatable
    #[arg(short = 'i', long = "input", value_name = "PATH", required = true)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RetrievalArgs {
    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Extra instructions added after the prompt header
    #[arg(long)]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Spawn the Ollama command-line client
    Cli,
    /// Call the Ollama HTTP API
    Http,
}

#[derive(Debug, Args)]
pub struct GenerationArgs {
    /// Model name passed to the backend
    #[arg(long, env = "FINQA_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Generation timeout in seconds
    #[arg(long, env = "FINQA_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// How to reach the model
    #[arg(long, value_enum, env = "FINQA_BACKEND", default_value_t = Backend::Cli)]
    pub backend: Backend,

    /// Ollama executable for the cli backend
    #[arg(long, env = "FINQA_OLLAMA_BIN", default_value = "ollama")]
    pub ollama_bin: String,

    /// Ollama base URL for the http backend
    #[arg(long, env = "FINQA_OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    pub ollama_url: String,
}

impl GenerationArgs {
    pub fn generator(&self) -> Box<dyn Generator> {
        match self.backend {
            Backend::Cli => {
                Box::new(OllamaCli::with_command(&self.ollama_bin, "run"))
            }
            Backend::Http => Box::new(OllamaHttp::new(&self.ollama_url)),
        }
    }
}

// -- Commands --

#[derive(Debug, Parser)]
pub struct ChunksArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub retrieval: RetrievalArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct PromptArgs {
    /// The question to build a prompt for
    pub question: String,

    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub retrieval: RetrievalArgs,
}

#[derive(Debug, Parser)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,

    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub retrieval: RetrievalArgs,

    #[command(flatten)]
    pub generation: GenerationArgs,

    /// Also print the retrieved chunks
    #[arg(long)]
    pub show_context: bool,
}

#[derive(Debug, Parser)]
pub struct ChatArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub retrieval: RetrievalArgs,

    #[command(flatten)]
    pub generation: GenerationArgs,

    /// Write the question/answer history to this file as JSON on exit
    #[arg(long)]
    pub transcript: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "finqa",
            &mut std::io::stdout(),
        );
    }
}
