use clap::{Parser, Subcommand};
use paper_triage::Result;
use paper_triage::commands::{
    add_paper, add_snippet, delete_paper, download_pdf, edit_notes, export_papers, fetch_arxiv,
    list_papers, list_snippets, recalculate, refresh_notes, remove_snippet, search_arxiv,
    search_papers, set_status, show_context, show_paper, show_stats, show_status, switch_model,
    use_context,
};
use paper_triage::config::{run_interactive_config, show_config};
use paper_triage::menu::run_menu;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paper-triage")]
#[command(about = "Score research papers against your interests and track what to read")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding server, scoring, and storage settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Show a health report for the server, context, and paper collection
    Status,
    /// Score a paper against the research context
    Add {
        /// Paper title
        #[arg(long)]
        title: String,
        /// Paper abstract
        #[arg(long = "abstract", value_name = "ABSTRACT")]
        abstract_text: String,
        /// Notes included in the scored text
        #[arg(long)]
        notes: Option<String>,
        /// Store the paper after scoring
        #[arg(long)]
        store: bool,
    },
    /// Search ArXiv and analyze a result
    Arxiv {
        /// Search query
        query: String,
        /// Maximum number of results
        #[arg(long, default_value_t = 10)]
        max: u32,
    },
    /// Fetch one ArXiv paper by id
    Fetch {
        /// ArXiv id, e.g. 2301.01234
        arxiv_id: String,
    },
    /// List stored papers ranked by relevance
    List {
        /// Filter by reading status (to_read, reading, read, discarded)
        #[arg(long)]
        status: Option<String>,
    },
    /// Show full details for one paper
    Show {
        /// Paper id or ArXiv id
        id: String,
    },
    /// Substring search over stored titles, abstracts, and notes
    Search {
        /// Text to search for
        term: String,
    },
    /// Change a paper's reading status
    SetStatus {
        /// Paper id or ArXiv id
        id: String,
        /// New status (to_read, reading, read, discarded)
        status: String,
    },
    /// Edit a paper's notes
    Note {
        /// Paper id or ArXiv id
        id: String,
        /// Note text; opens an editor when omitted
        #[arg(long)]
        text: Option<String>,
    },
    /// Delete a stored paper
    Delete {
        /// Paper id or ArXiv id
        id: String,
    },
    /// Show collection statistics
    Stats,
    /// Export stored papers as JSON
    Export {
        /// Output file path
        path: PathBuf,
        /// Filter by reading status
        #[arg(long)]
        status: Option<String>,
    },
    /// Download the PDF for a stored ArXiv paper
    Download {
        /// Paper id or ArXiv id
        id: String,
    },
    /// Manage the research context
    #[command(subcommand)]
    Context(ContextCommands),
    /// Manage context snippets
    #[command(subcommand)]
    Snippet(SnippetCommands),
    /// Re-embed the context and re-score every stored paper
    Recalculate,
    /// Refresh embeddings for papers whose notes changed
    RefreshNotes,
    /// Show or switch the embedding model
    Model {
        /// Model name; prompts with the configured chain when omitted
        name: Option<String>,
    },
    /// Interactive menu
    Menu,
}

#[derive(Subcommand)]
enum ContextCommands {
    /// Display the active research context
    Show,
    /// Point the configuration at a new context file
    Use {
        /// Path to the context file
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum SnippetCommands {
    /// Add a snippet to the research context
    Add {
        /// Where the snippet came from
        #[arg(long)]
        source: Option<String>,
        /// Id of the stored paper the snippet belongs to
        #[arg(long)]
        paper: Option<String>,
    },
    /// Remove a snippet by id
    Remove {
        /// Snippet id
        id: String,
    },
    /// List stored snippets
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Status => {
            show_status().await?;
        }
        Commands::Add {
            title,
            abstract_text,
            notes,
            store,
        } => {
            add_paper(title, abstract_text, notes, store).await?;
        }
        Commands::Arxiv { query, max } => {
            search_arxiv(query, max).await?;
        }
        Commands::Fetch { arxiv_id } => {
            fetch_arxiv(arxiv_id).await?;
        }
        Commands::List { status } => {
            list_papers(status).await?;
        }
        Commands::Show { id } => {
            show_paper(id).await?;
        }
        Commands::Search { term } => {
            search_papers(term).await?;
        }
        Commands::SetStatus { id, status } => {
            set_status(id, status).await?;
        }
        Commands::Note { id, text } => {
            edit_notes(id, text).await?;
        }
        Commands::Delete { id } => {
            delete_paper(id).await?;
        }
        Commands::Stats => {
            show_stats().await?;
        }
        Commands::Export { path, status } => {
            export_papers(path, status).await?;
        }
        Commands::Download { id } => {
            download_pdf(id).await?;
        }
        Commands::Context(command) => match command {
            ContextCommands::Show => {
                show_context().await?;
            }
            ContextCommands::Use { path } => {
                use_context(path).await?;
            }
        },
        Commands::Snippet(command) => match command {
            SnippetCommands::Add { source, paper } => {
                add_snippet(source, paper).await?;
            }
            SnippetCommands::Remove { id } => {
                remove_snippet(id).await?;
            }
            SnippetCommands::List => {
                list_snippets().await?;
            }
        },
        Commands::Recalculate => {
            recalculate().await?;
        }
        Commands::RefreshNotes => {
            refresh_notes().await?;
        }
        Commands::Model { name } => {
            switch_model(name).await?;
        }
        Commands::Menu => {
            run_menu().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["paper-triage", "list"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::List { .. });
        }
    }

    #[test]
    fn add_command_requires_title_and_abstract() {
        let cli = Cli::try_parse_from(["paper-triage", "add", "--title", "Surface Codes"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn add_command_with_flags() {
        let cli = Cli::try_parse_from([
            "paper-triage",
            "add",
            "--title",
            "Surface Codes",
            "--abstract",
            "We study decoders.",
            "--notes",
            "from reading group",
            "--store",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Add {
                title,
                abstract_text,
                notes,
                store,
            } = parsed.command
            {
                assert_eq!(title, "Surface Codes");
                assert_eq!(abstract_text, "We study decoders.");
                assert_eq!(notes, Some("from reading group".to_string()));
                assert!(store);
            }
        }
    }

    #[test]
    fn arxiv_command_defaults_max_results() {
        let cli = Cli::try_parse_from(["paper-triage", "arxiv", "quantum error correction"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Arxiv { query, max } = parsed.command {
                assert_eq!(query, "quantum error correction");
                assert_eq!(max, 10);
            }
        }
    }

    #[test]
    fn set_status_command_parses_kebab_name() {
        let cli = Cli::try_parse_from(["paper-triage", "set-status", "some-id", "read"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::SetStatus { id, status } = parsed.command {
                assert_eq!(id, "some-id");
                assert_eq!(status, "read");
            }
        }
    }

    #[test]
    fn context_use_subcommand() {
        let cli = Cli::try_parse_from(["paper-triage", "context", "use", "interests.txt"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Context(ContextCommands::Use { path }) = parsed.command {
                assert_eq!(path, PathBuf::from("interests.txt"));
            }
        }
    }

    #[test]
    fn snippet_add_subcommand_flags() {
        let cli = Cli::try_parse_from([
            "paper-triage",
            "snippet",
            "add",
            "--source",
            "2301.01234",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Snippet(SnippetCommands::Add { source, paper }) = parsed.command {
                assert_eq!(source, Some("2301.01234".to_string()));
                assert_eq!(paper, None);
            }
        }
    }

    #[test]
    fn refresh_notes_command_parses_kebab_name() {
        let cli = Cli::try_parse_from(["paper-triage", "refresh-notes"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::RefreshNotes);
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["paper-triage", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["paper-triage", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
