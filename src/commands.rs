use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Editor, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::arxiv::{ArxivClient, ArxivPaper};
use crate::config::{Config, get_config_dir};
use crate::context::Snippet;
use crate::database::{Database, NewPaper, NewSnippet, Paper, PaperStatus, StoredSnippet};
use crate::embedding::{EmbeddingClient, TextEncoder, resolve_encoder};
use crate::recalc::Recalculator;
use crate::scoring::recommendation;
use crate::session::{ResearchSession, ScoreReport};

/// Show a health report covering the embedding server, the research
/// context, and the stored paper collection
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load_default().unwrap_or_default();

    println!("📊 Paper Triage Status Report");
    println!("{}", "=".repeat(50));
    println!();

    // Database connectivity
    println!("🗄️  Database Status:");
    let database = match open_database().await {
        Ok(db) => {
            println!("   ✅ SQLite: Connected");
            Some(db)
        }
        Err(e) => {
            println!("   ❌ SQLite: Failed to connect - {}", e);
            None
        }
    };

    // Embedding server connectivity and model resolution
    println!("🤖 Embedding Server:");
    match config.server.server_url() {
        Ok(url) => {
            let client = EmbeddingClient::new(url.clone());
            match client.list_models() {
                Ok(models) => {
                    println!("   ✅ Server: Connected ({})", url);
                    println!("   🔢 Installed Models: {}", models.len());
                    match resolve_encoder(&client, &config.scoring.models) {
                        Ok(encoder) => {
                            println!("   📋 Active Model: {}", encoder.model_name());
                        }
                        Err(e) => {
                            println!("   ⚠️  Model: {}", e);
                        }
                    }
                }
                Err(e) => {
                    println!("   ❌ Server: Failed to connect - {}", e);
                }
            }
        }
        Err(e) => {
            println!("   ❌ Server: Invalid configuration - {}", e);
        }
    }

    // Context file state
    println!("📄 Research Context:");
    let context_path = config.context_file_path();
    if context_path.exists() {
        match std::fs::read_to_string(&context_path) {
            Ok(text) if text.trim().is_empty() => {
                println!("   ⚠️  Context file is empty: {}", context_path.display());
            }
            Ok(text) => {
                println!(
                    "   ✅ Context file: {} ({} chars)",
                    context_path.display(),
                    text.trim().len()
                );
            }
            Err(e) => {
                println!("   ❌ Failed to read context file: {}", e);
            }
        }
    } else {
        println!("   ❌ Context file not found: {}", context_path.display());
    }

    if let Some(database) = database {
        match database.count_snippets().await {
            Ok(count) => println!("   📎 Context Snippets: {}", count),
            Err(e) => println!("   ⚠️  Snippets: {}", e),
        }

        println!();
        println!("📚 Paper Collection:");
        match database.get_statistics().await {
            Ok(stats) => {
                println!("   📊 Total Papers: {}", stats.total_papers);
                println!(
                    "   📖 To Read: {} | Reading: {} | Read: {} | Discarded: {}",
                    stats.to_read, stats.reading, stats.read, stats.discarded
                );
                println!("   ⭐ Average Score: {:.1}/100", stats.average_score);
            }
            Err(e) => {
                println!("   ❌ Failed to load statistics: {}", e);
            }
        }

        match database.count_stale_papers().await {
            Ok(0) => println!("   ✅ All paper embeddings are current"),
            Ok(stale) => println!("   ⚠️  Papers needing re-embedding: {}", stale),
            Err(e) => println!("   ⚠️  Staleness: {}", e),
        }
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'paper-triage add' to score a paper against your context");
    println!("   • Use 'paper-triage arxiv <query>' to search and analyze ArXiv papers");
    println!("   • Use 'paper-triage menu' for the interactive workflow");

    Ok(())
}

/// Score a manually entered paper against the research context
#[inline]
pub async fn add_paper(
    title: String,
    abstract_text: String,
    notes: Option<String>,
    store: bool,
) -> Result<()> {
    info!("Scoring paper: {}", title);

    let config = load_config()?;
    let database = open_database().await?;
    let session = build_session(&config, &database).await?;

    if !session.has_context() {
        print_no_context_hint(&config);
        return Ok(());
    }

    let notes = notes.unwrap_or_default();
    let report = session.score_paper(&title, &abstract_text, &notes)?;
    print_score_report(&title, &report);

    if store {
        let paper = store_scored_paper(
            &database,
            &session,
            &title,
            &abstract_text,
            &notes,
            &report,
            None,
        )
        .await?;
        println!("✅ Paper stored (ID: {})", paper.id);
    }

    Ok(())
}

/// Search ArXiv, pick a result, and analyze it against the context
#[inline]
pub async fn search_arxiv(query: String, max_results: u32) -> Result<()> {
    let config = load_config()?;
    let database = open_database().await?;
    let session = build_session(&config, &database).await?;

    if !session.has_context() {
        print_no_context_hint(&config);
        return Ok(());
    }

    let client = ArxivClient::new()?;
    println!("🔍 Searching ArXiv for '{}'...", query);
    let results = client.search(&query, max_results)?;

    if results.is_empty() {
        println!("No ArXiv results found for '{}'.", query);
        return Ok(());
    }

    let items: Vec<String> = results
        .iter()
        .map(|paper| format!("{} ({})", paper.title, paper.arxiv_id))
        .collect();

    let selection = Select::new()
        .with_prompt("Select a paper to analyze")
        .items(&items)
        .default(0)
        .interact()?;

    let paper = &results[selection];
    print_arxiv_paper(paper);
    score_and_offer_storage(&config, &database, &session, &client, paper).await?;

    Ok(())
}

/// Fetch one ArXiv paper by id and analyze it against the context
#[inline]
pub async fn fetch_arxiv(arxiv_id: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database().await?;
    let session = build_session(&config, &database).await?;

    if !session.has_context() {
        print_no_context_hint(&config);
        return Ok(());
    }

    let client = ArxivClient::new()?;
    println!("🔍 Fetching {} from ArXiv...", arxiv_id);

    let Some(paper) = client.fetch_by_id(&arxiv_id)? else {
        println!("❌ No ArXiv paper found for id '{}'.", arxiv_id);
        return Ok(());
    };

    print_arxiv_paper(&paper);

    if Confirm::new()
        .with_prompt("Analyze this paper?")
        .default(true)
        .interact()?
    {
        score_and_offer_storage(&config, &database, &session, &client, &paper).await?;
    }

    Ok(())
}

/// List stored papers ranked by relevance, optionally filtered by status
#[inline]
pub async fn list_papers(status: Option<String>) -> Result<()> {
    let database = open_database().await?;

    let papers = match status {
        Some(raw) => {
            let status: PaperStatus = raw.parse()?;
            database.list_papers_by_status(status).await?
        }
        None => database.list_papers().await?,
    };

    if papers.is_empty() {
        println!("No papers stored yet.");
        println!("Use 'paper-triage add' or 'paper-triage arxiv <query>' to analyze one.");
        return Ok(());
    }

    println!("Papers ({} total):", papers.len());
    println!();

    for paper in &papers {
        print_paper_summary(paper);
    }

    Ok(())
}

/// Show full details for one stored paper
#[inline]
pub async fn show_paper(id: String) -> Result<()> {
    let database = open_database().await?;
    let paper = find_paper(&database, &id).await?;

    println!("📄 {}", style(&paper.title).bold());
    println!("{}", "=".repeat(50));
    println!("ID: {}", paper.id);
    println!(
        "Score: {:.1}/100 ({})",
        paper.display_score(),
        paper.category
    );
    println!("Recommendation: {}", recommendation(paper.category));
    println!("Status: {}", paper.status);

    if let Some(arxiv_id) = &paper.arxiv_id {
        println!("ArXiv: {}", arxiv_id);
    }
    if let Some(authors) = &paper.authors {
        println!("Authors: {}", authors);
    }
    if let Some(published) = &paper.published {
        println!("Published: {}", published);
    }
    if let Some(pdf_path) = &paper.pdf_path {
        println!("PDF: {}", pdf_path);
    }
    if let Some(model) = &paper.embedding_model {
        println!("Scored With: {}", model);
    }
    if paper.embedding_needs_update {
        println!("⚠️  Embedding needs refresh");
    }
    println!("Added: {}", paper.added_date.format("%Y-%m-%d %H:%M:%S"));

    println!();
    println!("Abstract:");
    println!("{}", paper.abstract_text);

    if paper.has_notes() {
        println!();
        println!("Notes:");
        println!("{}", paper.notes);
    }

    Ok(())
}

/// Substring search over stored titles, abstracts, and notes
#[inline]
pub async fn search_papers(term: String) -> Result<()> {
    let database = open_database().await?;
    let papers = database.search_papers(&term).await?;

    if papers.is_empty() {
        println!("No papers match '{}'.", term);
        return Ok(());
    }

    println!("Papers matching '{}' ({} found):", term, papers.len());
    println!();

    for paper in &papers {
        print_paper_summary(paper);
    }

    Ok(())
}

/// Change a paper's reading status
#[inline]
pub async fn set_status(id: String, status: String) -> Result<()> {
    let database = open_database().await?;
    let status: PaperStatus = status.parse()?;
    let paper = find_paper(&database, &id).await?;

    database.update_paper_status(&paper.id, status).await?;
    println!("✅ '{}' is now marked: {}", paper.title, status);

    Ok(())
}

/// Edit a paper's notes, opening an editor when no text is given
#[inline]
pub async fn edit_notes(id: String, text: Option<String>) -> Result<()> {
    let database = open_database().await?;
    let paper = find_paper(&database, &id).await?;

    let notes = match text {
        Some(text) => text,
        None => match Editor::new().edit(&paper.notes)? {
            Some(edited) => edited,
            None => {
                println!("Note edit cancelled.");
                return Ok(());
            }
        },
    };

    database.set_paper_notes(&paper.id, &notes).await?;
    println!("✅ Notes updated for '{}'", paper.title);
    println!("   The cached embedding is now stale; run 'paper-triage refresh-notes' to re-score.");

    Ok(())
}

/// Delete a stored paper after confirmation
#[inline]
pub async fn delete_paper(id: String) -> Result<()> {
    let database = open_database().await?;
    let paper = find_paper(&database, &id).await?;

    println!("Found paper: {} (ID: {})", paper.title, paper.id);
    println!("This will delete the paper and its cached embedding.");

    if !Confirm::new()
        .with_prompt("Delete this paper? This action cannot be undone.")
        .default(false)
        .interact()?
    {
        println!("Deletion cancelled.");
        return Ok(());
    }

    database.delete_paper(&paper.id).await?;
    database.optimize().await?;
    println!("✅ Paper deleted: {}", paper.title);

    Ok(())
}

/// Show collection statistics
#[inline]
pub async fn show_stats() -> Result<()> {
    let database = open_database().await?;
    let stats = database.get_statistics().await?;
    let snippets = database.count_snippets().await?;
    let stale = database.count_stale_papers().await?;

    println!("📊 Paper Collection Statistics");
    println!("{}", "=".repeat(50));
    println!("Total Papers: {}", stats.total_papers);
    println!();
    println!("By Status:");
    println!("  To Read: {}", stats.to_read);
    println!("  Reading: {}", stats.reading);
    println!("  Read: {}", stats.read);
    println!("  Discarded: {}", stats.discarded);
    println!();
    println!("By Relevance:");
    println!("  Highly Relevant: {}", stats.highly);
    println!("  Moderately Relevant: {}", stats.moderately);
    println!("  Somewhat Relevant: {}", stats.somewhat);
    println!("  Low Relevance: {}", stats.low);
    println!();
    println!("Average Score: {:.1}/100", stats.average_score);
    println!("Papers with PDFs: {}", stats.with_pdf);
    println!("Context Snippets: {}", snippets);

    if stale > 0 {
        println!("⚠️  Papers needing re-embedding: {}", stale);
    }

    Ok(())
}

/// Export stored papers as JSON, optionally filtered by status
#[inline]
pub async fn export_papers(path: PathBuf, status: Option<String>) -> Result<()> {
    let database = open_database().await?;

    let papers = match status {
        Some(raw) => {
            let status: PaperStatus = raw.parse()?;
            database.list_papers_by_status(status).await?
        }
        None => database.list_papers().await?,
    };

    let json = serde_json::to_string_pretty(&papers).context("Failed to serialize papers")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;

    println!("✅ Exported {} papers to {}", papers.len(), path.display());

    Ok(())
}

/// Download the PDF for a stored ArXiv paper into the papers directory
#[inline]
pub async fn download_pdf(id: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database().await?;
    let paper = find_paper(&database, &id).await?;

    let Some(arxiv_id) = paper.arxiv_id.clone() else {
        println!(
            "❌ '{}' has no ArXiv id; only ArXiv papers can be downloaded.",
            paper.title
        );
        return Ok(());
    };

    let client = ArxivClient::new()?;
    let dir = config.papers_dir_path();
    println!("⬇️  Downloading PDF for {}...", arxiv_id);

    let path = client.download_pdf(&arxiv_id, &paper.title, &dir)?;
    database
        .set_paper_pdf_path(&paper.id, &path.to_string_lossy())
        .await?;

    println!("✅ PDF saved to {}", path.display());

    Ok(())
}

/// Display the active research context and its snippets
#[inline]
pub async fn show_context() -> Result<()> {
    let config = load_config()?;
    let database = open_database().await?;

    println!("📄 Research Context");
    println!("{}", "=".repeat(50));

    let context_path = config.context_file_path();
    println!("Context file: {}", context_path.display());

    if !context_path.exists() {
        println!();
        println!("❌ The context file does not exist yet.");
        println!(
            "Write your research interests to it, or point at another file with 'paper-triage context use <path>'."
        );
        return Ok(());
    }

    let base_text = std::fs::read_to_string(&context_path)
        .with_context(|| format!("Failed to read context file: {}", context_path.display()))?;

    if base_text.trim().is_empty() {
        println!();
        println!("⚠️  The context file is empty.");
        return Ok(());
    }

    println!();
    println!("{}", base_text.trim());

    let snippets = database.list_snippets().await?;
    if !snippets.is_empty() {
        println!();
        println!("Snippets ({}):", snippets.len());
        println!();
        for snippet in &snippets {
            print_snippet(snippet);
        }
    }

    Ok(())
}

/// Point the configuration at a new context file and re-embed it
#[inline]
pub async fn use_context(path: PathBuf) -> Result<()> {
    let mut config = load_config()?;

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read context file: {}", path.display()))?;
    if text.trim().is_empty() {
        return Err(anyhow::anyhow!("Context file {} is empty", path.display()));
    }

    // Store the absolute path so the config is not tied to the current
    // working directory.
    let absolute = std::fs::canonicalize(&path)
        .with_context(|| format!("Failed to resolve context file path: {}", path.display()))?;

    config.storage.set_context_file(absolute.clone())?;
    config.save()?;
    println!("✅ Context file set to {}", absolute.display());

    let database = open_database().await?;
    let session = build_session(&config, &database).await?;
    println!("✅ Context embedded with model {}", session.model_name());
    println!("💡 Run 'paper-triage recalculate' to re-score stored papers against the new context.");

    Ok(())
}

/// Add a snippet to the research context, re-embedding synchronously
#[inline]
pub async fn add_snippet(source: Option<String>, paper_id: Option<String>) -> Result<()> {
    let config = load_config()?;
    let database = open_database().await?;
    let mut session = build_session(&config, &database).await?;

    if !session.has_context() {
        print_no_context_hint(&config);
        return Ok(());
    }

    // Validate the paper reference before touching the context.
    if let Some(paper_id) = &paper_id {
        if database.get_paper(paper_id).await?.is_none() {
            return Err(anyhow::anyhow!("Paper not found: {}", paper_id));
        }
    }

    let content: String = Input::new()
        .with_prompt("Snippet text")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Snippet text cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let snippet = session.add_snippet(&content, source, paper_id)?;

    let new_snippet = NewSnippet {
        id: snippet.id.clone(),
        content: snippet.content.clone(),
        source: snippet.source.clone(),
        paper_id: snippet.paper_id.clone(),
    };
    database.create_snippet(&new_snippet).await?;

    println!("✅ Snippet added (ID: {})", snippet.id);
    println!(
        "💡 Run 'paper-triage recalculate' to re-score stored papers against the expanded context."
    );

    Ok(())
}

/// Remove a snippet from the research context by id
#[inline]
pub async fn remove_snippet(id: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database().await?;
    let mut session = build_session(&config, &database).await?;

    if session.has_context() {
        if !session.remove_snippet(&id)? {
            return Err(anyhow::anyhow!("Snippet not found: {}", id));
        }
        database.delete_snippet(&id).await?;
    } else if !database.delete_snippet(&id).await? {
        // No context loaded, so the session never saw the snippet; fall back
        // to the store directly.
        return Err(anyhow::anyhow!("Snippet not found: {}", id));
    }

    println!("✅ Snippet removed: {}", id);
    println!(
        "💡 Run 'paper-triage recalculate' to re-score stored papers against the reduced context."
    );

    Ok(())
}

/// List stored context snippets in composition order
#[inline]
pub async fn list_snippets() -> Result<()> {
    let database = open_database().await?;
    let snippets = database.list_snippets().await?;

    if snippets.is_empty() {
        println!("No context snippets stored.");
        println!("Use 'paper-triage snippet add' to extend the research context.");
        return Ok(());
    }

    println!("Context Snippets ({} total):", snippets.len());
    println!();

    for snippet in &snippets {
        print_snippet(snippet);
    }

    Ok(())
}

/// Re-embed the context and re-score every stored paper
#[inline]
pub async fn recalculate() -> Result<()> {
    let config = load_config()?;
    let database = open_database().await?;
    let mut session = build_session(&config, &database).await?;

    if !session.has_context() {
        print_no_context_hint(&config);
        return Ok(());
    }

    session.recalculate_context()?;
    println!("✅ Context re-embedded with model {}", session.model_name());

    let recalculator = Recalculator::new(&session, &database);
    let bar = progress_bar("Re-scoring papers");
    let stats = recalculator
        .recalculate_all_scores(|processed, total| {
            bar.set_length(total as u64);
            bar.set_position(processed as u64);
        })
        .await?;
    bar.finish_and_clear();

    if stats.total == 0 {
        println!("No papers stored; nothing to re-score.");
        return Ok(());
    }

    println!("Re-scoring complete!");
    println!("  Papers processed: {}", stats.total);
    println!("  Updated: {}", stats.updated);
    println!("  Unchanged: {}", stats.unchanged);
    if stats.errors > 0 {
        println!("  ⚠️  Errors: {}", stats.errors);
    }

    Ok(())
}

/// Refresh embeddings for papers whose notes changed since the last embed
#[inline]
pub async fn refresh_notes() -> Result<()> {
    let config = load_config()?;
    let database = open_database().await?;
    let session = build_session(&config, &database).await?;

    if !session.has_context() {
        print_no_context_hint(&config);
        return Ok(());
    }

    let recalculator = Recalculator::new(&session, &database);
    let bar = progress_bar("Refreshing note embeddings");
    let stats = recalculator
        .refresh_note_embeddings(|processed, total| {
            bar.set_length(total as u64);
            bar.set_position(processed as u64);
        })
        .await?;
    bar.finish_and_clear();

    if stats.updated == 0 && stats.errors == 0 {
        println!("No stale note embeddings to refresh.");
        return Ok(());
    }

    println!("Note refresh complete!");
    println!("  Embeddings refreshed: {}", stats.updated);
    if stats.errors > 0 {
        println!("  ⚠️  Errors: {}", stats.errors);
    }

    Ok(())
}

/// Switch the embedding model: resolve the new encoder, rebuild the session,
/// flag every paper stale, re-score, and promote the model in the config
#[inline]
pub async fn switch_model(name: Option<String>) -> Result<()> {
    let mut config = load_config()?;
    let database = open_database().await?;

    println!("Current model chain: {}", config.scoring.models.join(", "));

    let chosen = match name {
        Some(name) => name,
        None => {
            let mut items = config.scoring.models.clone();
            items.push("Custom model name".to_string());

            let selection = Select::new()
                .with_prompt("Select the embedding model")
                .items(&items)
                .default(0)
                .interact()?;

            if selection == items.len() - 1 {
                Input::new()
                    .with_prompt("Model name")
                    .validate_with(|input: &String| -> Result<(), &str> {
                        if input.trim().is_empty() {
                            Err("Model name cannot be empty")
                        } else {
                            Ok(())
                        }
                    })
                    .interact_text()?
            } else {
                items[selection].clone()
            }
        }
    };

    println!("🔄 Switching to embedding model '{}'...", chosen);
    info!("Switching embedding model to {}", chosen);

    // Resolve the new encoder and rebuild the session before touching any
    // stored state, so a failed switch leaves everything as it was.
    let session = build_session_with_models(&config, &database, &[chosen.clone()]).await?;

    let stale = database.mark_all_papers_stale().await?;
    println!("✅ Model switched to '{}'", chosen);
    println!("   {} stored papers flagged for re-scoring", stale);

    if session.has_context() {
        let recalculator = Recalculator::new(&session, &database);
        let bar = progress_bar("Re-scoring papers");
        let stats = recalculator
            .recalculate_all_scores(|processed, total| {
                bar.set_length(total as u64);
                bar.set_position(processed as u64);
            })
            .await?;
        bar.finish_and_clear();

        if stats.total > 0 {
            println!(
                "Re-scoring complete: {} updated, {} unchanged, {} errors",
                stats.updated, stats.unchanged, stats.errors
            );
        }
    } else {
        println!(
            "⚠️  No research context loaded; scores will refresh once a context is set and 'paper-triage recalculate' runs."
        );
    }

    config.scoring.promote_model(chosen)?;
    config.save()?;
    println!("✅ Configuration updated");

    Ok(())
}

/// Open the paper database under the platform config directory.
async fn open_database() -> Result<Database> {
    let config_dir = get_config_dir()?;
    Database::initialize_from_config_dir(&config_dir)
        .await
        .context("Failed to initialize database")
}

fn load_config() -> Result<Config> {
    Config::load_default().context("Failed to load configuration")
}

/// Resolve the configured model chain and hydrate a session from the context
/// file and stored snippets. A missing or empty context file leaves the
/// session without a context rather than failing.
async fn build_session(config: &Config, database: &Database) -> Result<ResearchSession> {
    build_session_with_models(config, database, &config.scoring.models).await
}

async fn build_session_with_models(
    config: &Config,
    database: &Database,
    models: &[String],
) -> Result<ResearchSession> {
    let server_url = config.server.server_url()?;
    let client = EmbeddingClient::new(server_url);
    let encoder = resolve_encoder(&client, models)?;
    let thresholds = config.scoring.threshold_table()?;
    let mut session = ResearchSession::new(Box::new(encoder), thresholds);

    let context_path = config.context_file_path();
    if !context_path.exists() {
        warn!("Context file {} does not exist", context_path.display());
        return Ok(session);
    }

    let base_text = std::fs::read_to_string(&context_path)
        .with_context(|| format!("Failed to read context file: {}", context_path.display()))?;
    if base_text.trim().is_empty() {
        warn!("Context file {} is empty", context_path.display());
        return Ok(session);
    }

    let snippets: Vec<Snippet> = database
        .list_snippets()
        .await?
        .into_iter()
        .map(Snippet::from)
        .collect();
    session.hydrate(&base_text, snippets)?;

    Ok(session)
}

/// Score an ArXiv paper, print the analysis, and walk the user through
/// storing it and downloading the PDF.
async fn score_and_offer_storage(
    config: &Config,
    database: &Database,
    session: &ResearchSession,
    client: &ArxivClient,
    paper: &ArxivPaper,
) -> Result<()> {
    if let Some(existing) = database.get_paper_by_arxiv_id(&paper.arxiv_id).await? {
        println!(
            "📕 Already stored (ID: {}, score {:.1}/100)",
            existing.id,
            existing.display_score()
        );
        return Ok(());
    }

    let report = session.score_paper(&paper.title, &paper.abstract_text, "")?;
    print_score_report(&paper.title, &report);

    if !Confirm::new()
        .with_prompt("Store this paper?")
        .default(true)
        .interact()?
    {
        return Ok(());
    }

    let stored = store_scored_paper(
        database,
        session,
        &paper.title,
        &paper.abstract_text,
        "",
        &report,
        Some(paper),
    )
    .await?;
    println!("✅ Paper stored (ID: {})", stored.id);

    if Confirm::new()
        .with_prompt("Download the PDF?")
        .default(false)
        .interact()?
    {
        let dir = config.papers_dir_path();
        let path = client.download_pdf(&paper.arxiv_id, &paper.title, &dir)?;
        database
            .set_paper_pdf_path(&stored.id, &path.to_string_lossy())
            .await?;
        println!("✅ PDF saved to {}", path.display());
    }

    Ok(())
}

async fn store_scored_paper(
    database: &Database,
    session: &ResearchSession,
    title: &str,
    abstract_text: &str,
    notes: &str,
    report: &ScoreReport,
    arxiv: Option<&ArxivPaper>,
) -> Result<Paper> {
    let new_paper = NewPaper {
        title: title.to_string(),
        abstract_text: abstract_text.to_string(),
        notes: notes.to_string(),
        relevance_score: report.raw_score,
        category: report.category,
        arxiv_id: arxiv.map(|p| p.arxiv_id.clone()),
        authors: arxiv.and_then(|p| (!p.authors.is_empty()).then(|| p.authors.clone())),
        published: arxiv.and_then(|p| (!p.published.is_empty()).then(|| p.published.clone())),
        embedding: Some(report.embedding.clone()),
        embedding_model: Some(session.model_name().to_string()),
    };

    database.create_paper(&new_paper).await
}

/// Papers can be addressed by their id or their ArXiv id.
async fn find_paper(database: &Database, identifier: &str) -> Result<Paper> {
    if let Some(paper) = database.get_paper(identifier).await? {
        return Ok(paper);
    }
    if let Some(paper) = database.get_paper_by_arxiv_id(identifier).await? {
        return Ok(paper);
    }

    Err(anyhow::anyhow!("Paper not found: {}", identifier))
}

fn print_score_report(title: &str, report: &ScoreReport) {
    println!();
    println!("📊 Relevance Analysis");
    println!("{}", "=".repeat(50));
    println!("Title: {}", title);
    println!("Score: {:.1}/100", report.display_score);
    println!("Category: {}", report.category);
    println!(
        "Recommendation: {}",
        style(recommendation(report.category)).cyan()
    );
    println!();
}

fn print_paper_summary(paper: &Paper) {
    println!("📄 {} (ID: {})", paper.title, paper.id);
    println!(
        "   Score: {:.1}/100 ({})",
        paper.display_score(),
        paper.category
    );
    println!("   Status: {}", paper.status);
    if let Some(arxiv_id) = &paper.arxiv_id {
        println!("   ArXiv: {}", arxiv_id);
    }
    if paper.embedding_needs_update {
        println!("   ⚠️  Embedding needs refresh");
    }
    println!("   Added: {}", paper.added_date.format("%Y-%m-%d %H:%M:%S"));
    println!();
}

fn print_arxiv_paper(paper: &ArxivPaper) {
    println!();
    println!("📄 {}", style(&paper.title).bold());
    println!("   ArXiv ID: {}", paper.arxiv_id);
    if !paper.authors.is_empty() {
        println!("   Authors: {}", paper.authors);
    }
    if !paper.published.is_empty() {
        println!("   Published: {}", paper.published);
    }
    if !paper.categories.is_empty() {
        println!("   Categories: {}", paper.categories);
    }
    println!("   Abstract: {}", preview(&paper.abstract_text, 300));
}

fn print_snippet(snippet: &StoredSnippet) {
    println!("📎 {} (ID: {})", preview(&snippet.content, 80), snippet.id);
    if let Some(source) = &snippet.source {
        println!("   Source: {}", source);
    }
    if let Some(paper_id) = &snippet.paper_id {
        println!("   Paper: {}", paper_id);
    }
    println!(
        "   Added: {}",
        snippet.added_date.format("%Y-%m-%d %H:%M:%S")
    );
    println!();
}

fn print_no_context_hint(config: &Config) {
    println!("❌ No research context loaded.");
    println!(
        "   Expected context file: {}",
        config.context_file_path().display()
    );
    println!(
        "   Write your research interests there, or point at another file with 'paper-triage context use <path>'."
    );
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let prefix: String = text.chars().take(max_chars).collect();
    format!("{}...", prefix.trim_end())
}

/// Progress bar over a batch pass. Length is supplied through the progress
/// callbacks once the batch size is known.
fn progress_bar(label: &str) -> ProgressBar {
    let bar = if console::user_attended_stderr() {
        ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}")
                .expect("style template is valid"),
        )
    } else {
        ProgressBar::hidden()
    };
    bar.set_position(0);
    bar.set_message(label.to_string());
    bar
}
