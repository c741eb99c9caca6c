use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use atty::Stream;
use clap::{Parser, Subcommand};
use lexique::observe::TraceObserver;
use lexique::{MatchSpan, TermEntry, TermStore, highlight_spans, normalize};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};

#[derive(Parser, Debug)]
#[command(
    name = "lexique",
    about = "Recognize and highlight French glossary terms",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    /// JSON file holding the glossary entries.
    #[arg(long, global = true, default_value = "glossary.json")]
    glossary: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Operations on glossary entries.
    #[command(subcommand)]
    Term(TermCommand),
    /// Split a text into plain and glossary-matched spans.
    Highlight {
        /// Text to annotate.
        text: String,
        /// Also run the loose keyword scan used to tag instructions.
        #[arg(long)]
        keywords: bool,
    },
    /// Show how words normalize for loose matching.
    Normalize {
        #[arg(required = true)]
        words: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TermCommand {
    /// List active entries, optionally filtered by category.
    List {
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show the full entry for a term, related entries included.
    Show {
        /// Canonical term, matched case-insensitively.
        term: String,
    },
    /// List the categories present in the glossary.
    Categories,
}

pub fn run() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    let store = load_store(&cli.glossary)?;
    match cli.command {
        Command::Term(TermCommand::List { category }) => handle_list(&store, category, cli.json),
        Command::Term(TermCommand::Show { term }) => handle_show(&store, &term, cli.json),
        Command::Term(TermCommand::Categories) => handle_categories(&store, cli.json),
        Command::Highlight { text, keywords } => handle_highlight(&store, &text, keywords, cli.json),
        Command::Normalize { words } => handle_normalize(words, cli.json),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_store(path: &Path) -> Result<TermStore, Box<dyn Error>> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read glossary {}: {err}", path.display()))?;
    let entries: Vec<TermEntry> = serde_json::from_str(&raw)
        .map_err(|err| format!("Failed to parse glossary {}: {err}", path.display()))?;
    Ok(TermStore::new(entries))
}

fn handle_list(
    store: &TermStore,
    category: Option<String>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let entries: Vec<&TermEntry> = match &category {
        Some(category) => store.by_category(category).collect(),
        None => store.entries().iter().collect(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_entry_table(&entries, category.as_deref());
    }
    Ok(())
}

fn handle_show(store: &TermStore, term: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    let entry = store
        .get(term)
        .ok_or_else(|| format!("No active entry found for term {term:?}"))?;
    let related = store.resolve_related(&entry.related_terms);

    if as_json {
        let payload = json!({
            "id": entry.id,
            "term": entry.term,
            "definition": entry.definition,
            "example": entry.example,
            "category": entry.category,
            "variants": entry.variants,
            "related_terms": related,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Terme: {}", entry.term);
        if let Some(category) = &entry.category {
            println!("Catégorie: {category}");
        }
        render_markdown_block("Définition", &entry.definition);
        if let Some(example) = &entry.example {
            println!("\nExemple: \"{example}\"");
        }
        if !entry.variants.is_empty() {
            println!("\nVariantes: {}", entry.variants.join(", "));
        }
        if !related.is_empty() {
            println!("\nTermes connexes:");
            for item in &related {
                println!("- {}: {}", item.term, item.definition);
            }
        }
    }
    Ok(())
}

fn handle_categories(store: &TermStore, as_json: bool) -> Result<(), Box<dyn Error>> {
    let categories = store.categories();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
    } else if categories.is_empty() {
        println!("No categories defined.");
    } else {
        for category in &categories {
            let count = store.by_category(category).count();
            println!("{category} ({count})");
        }
    }
    Ok(())
}

fn handle_highlight(
    store: &TermStore,
    text: &str,
    keywords: bool,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let spans = highlight_spans(text, store, &TraceObserver);

    if as_json {
        let payload = json!({
            "text": text,
            "spans": spans.iter().map(|span| {
                json!({
                    "text": span.text,
                    "term": span.matched_term.map(|t| t.term.as_str()),
                })
            }).collect::<Vec<_>>(),
            "keywords": keywords.then(|| {
                store
                    .scan_keywords(text)
                    .iter()
                    .map(|e| e.term.clone())
                    .collect::<Vec<_>>()
            }),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    render_markdown_block("Texte annoté", &spans_to_markdown(&spans));
    print_match_table(&spans);
    if keywords {
        let found = store.scan_keywords(text);
        if found.is_empty() {
            println!("\nKeyword scan: no entries found.");
        } else {
            let terms: Vec<&str> = found.iter().map(|e| e.term.as_str()).collect();
            println!("\nKeyword scan: {}", terms.join(", "));
        }
    }
    Ok(())
}

fn handle_normalize(words: Vec<String>, as_json: bool) -> Result<(), Box<dyn Error>> {
    let rows: Vec<(String, String)> = words
        .into_iter()
        .map(|word| {
            let normalized = normalize(&word);
            (word, normalized.base)
        })
        .collect();

    if as_json {
        let payload: Vec<_> = rows
            .iter()
            .map(|(word, base)| json!({ "word": word, "base": base }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let width = rows
            .iter()
            .map(|(word, _)| word.chars().count())
            .max()
            .unwrap_or(4)
            .max("WORD".len());
        println!("{:<width$}  {}", "WORD", "BASE", width = width);
        println!("{:-<width$}  {}", "", "----", width = width);
        for (word, base) in &rows {
            println!("{:<width$}  {}", word, base, width = width);
        }
    }
    Ok(())
}

fn spans_to_markdown(spans: &[MatchSpan<'_>]) -> String {
    let mut rendered = String::new();
    for span in spans {
        if span.matched_term.is_some() {
            rendered.push_str("**");
            rendered.push_str(span.text);
            rendered.push_str("**");
        } else {
            rendered.push_str(span.text);
        }
    }
    rendered
}

fn print_entry_table(entries: &[&TermEntry], category: Option<&str>) {
    if entries.is_empty() {
        match category {
            Some(category) => println!("No active entries in category \"{category}\"."),
            None => println!("No active entries."),
        }
        return;
    }
    let width = entries
        .iter()
        .map(|e| e.term.chars().count())
        .max()
        .unwrap_or(5)
        .max("TERME".len());
    println!("{:<width$}  {}", "TERME", "DÉFINITION", width = width);
    println!("{:-<width$}  {}", "", "----------", width = width);
    for entry in entries {
        println!(
            "{:<width$}  {}",
            entry.term,
            snippet(&entry.definition, 72),
            width = width
        );
    }
}

fn print_match_table(spans: &[MatchSpan<'_>]) {
    let rows: Vec<(&str, &str)> = spans
        .iter()
        .filter_map(|span| span.matched_term.map(|term| (span.text, term.term.as_str())))
        .collect();
    if rows.is_empty() {
        println!("\nNo glossary terms matched.");
        return;
    }
    let width = rows
        .iter()
        .map(|(word, _)| word.chars().count())
        .max()
        .unwrap_or(4)
        .max("MOT".len());
    println!("\n{:<width$}  {}", "MOT", "TERME", width = width);
    println!("{:-<width$}  {}", "", "-----", width = width);
    for (word, term) in &rows {
        println!("{:<width$}  {}", word, term, width = width);
    }
}

fn snippet(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (idx, ch) in text.chars().enumerate() {
        if idx >= max_chars {
            out.push('…');
            break;
        }
        out.push(ch);
    }
    out
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn render_markdown_block(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("\n{title}:");
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
