// Menu module
// Interactive workflow loop driving the same handlers as the CLI subcommands

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};

use crate::commands;

/// Run the interactive menu until the user quits.
///
/// Each action reuses a CLI command handler; failures are printed and the
/// loop continues, so one unreachable server does not end the session.
#[inline]
pub async fn run_menu() -> Result<()> {
    println!("📚 Paper Triage");
    println!("{}", "=".repeat(50));

    loop {
        println!();

        let options = vec![
            "Analyze a paper",
            "Search ArXiv",
            "View papers",
            "Search stored papers",
            "Statistics",
            "Show research context",
            "Switch embedding model",
            "Export papers",
            "Quit",
        ];

        let selection = Select::new()
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(0)
            .interact()?;

        if selection == options.len() - 1 {
            break;
        }

        let result = match selection {
            0 => analyze_paper().await,
            1 => search_arxiv().await,
            2 => view_papers().await,
            3 => search_papers().await,
            4 => commands::show_stats().await,
            5 => commands::show_context().await,
            6 => commands::switch_model(None).await,
            7 => export_papers().await,
            _ => Ok(()),
        };

        if let Err(e) = result {
            eprintln!("❌ {:#}", e);
        }
    }

    println!("Goodbye!");
    Ok(())
}

async fn analyze_paper() -> Result<()> {
    let title: String = Input::new()
        .with_prompt("Paper title")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Title cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let abstract_text: String = Input::new()
        .with_prompt("Paper abstract")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Abstract cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let notes: String = Input::new()
        .with_prompt("Notes (optional)")
        .allow_empty(true)
        .interact_text()?;
    let notes = if notes.trim().is_empty() {
        None
    } else {
        Some(notes)
    };

    let store = Confirm::new()
        .with_prompt("Store the paper after scoring?")
        .default(true)
        .interact()?;

    commands::add_paper(title, abstract_text, notes, store).await
}

async fn search_arxiv() -> Result<()> {
    let query: String = Input::new()
        .with_prompt("Search query")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Search query cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let max_results: u32 = Input::new()
        .with_prompt("Maximum results")
        .default(10)
        .interact_text()?;

    commands::search_arxiv(query, max_results).await
}

async fn view_papers() -> Result<()> {
    let options = vec![
        "All papers",
        "To read",
        "Reading",
        "Read",
        "Discarded",
    ];

    let selection = Select::new()
        .with_prompt("Which papers?")
        .items(&options)
        .default(0)
        .interact()?;

    let status = match selection {
        1 => Some("to_read".to_string()),
        2 => Some("reading".to_string()),
        3 => Some("read".to_string()),
        4 => Some("discarded".to_string()),
        _ => None,
    };

    commands::list_papers(status).await
}

async fn search_papers() -> Result<()> {
    let term: String = Input::new()
        .with_prompt("Search term")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Search term cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    commands::search_papers(term).await
}

async fn export_papers() -> Result<()> {
    let path: String = Input::new()
        .with_prompt("Export file path")
        .default("papers_export.json".to_string())
        .interact_text()?;

    commands::export_papers(path.into(), None).await
}
