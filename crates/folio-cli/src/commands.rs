use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use folio_crypto::{canonical_content, content_hash};
use folio_diff::{diff_documents, DocumentDiff, LineOp, SectionAction};
use folio_server::{FolioServer, ServerConfig};
use folio_types::Content;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Diff(args) => cmd_diff(args, cli.format),
        Command::Canonical(args) => cmd_canonical(args),
        Command::Hash(args) => cmd_hash(args, cli.format),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    println!("{} Folio server on {}", "▶".green().bold(), config.bind_addr.to_string().bold());
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(FolioServer::new(config).serve())?;
    Ok(())
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let from = read_document(&args.from)?;
    let to = read_document(&args.to)?;
    let diff = diff_documents(&from, &to);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
        return Ok(());
    }

    if !args.sections {
        print_lines(&diff);
        println!();
    }
    print_sections(&diff);
    println!(
        "{} {}, {} {}",
        diff.added_line_count.to_string().green(),
        "added".green(),
        diff.removed_line_count.to_string().red(),
        "removed".red()
    );
    Ok(())
}

fn print_lines(diff: &DocumentDiff) {
    for line in &diff.lines {
        let text = format!("{}{}", line.op.prefix(), line.text);
        match line.op {
            LineOp::Insert => println!("{}", text.green()),
            LineOp::Delete => println!("{}", text.red()),
            LineOp::Equal => println!("{}", text.dimmed()),
        }
    }
}

fn print_sections(diff: &DocumentDiff) {
    for change in &diff.section_summary {
        let label = match change.action {
            SectionAction::Added => "added".green(),
            SectionAction::Deleted => "deleted".red(),
            SectionAction::Modified => "modified".yellow(),
            SectionAction::Unchanged => "unchanged".dimmed(),
        };
        println!("  {:<10} {}", label, change.section_key);
    }
}

fn cmd_canonical(args: DocumentArgs) -> anyhow::Result<()> {
    let document = read_document(&args.path)?;
    println!("{}", canonical_content(&document));
    Ok(())
}

fn cmd_hash(args: DocumentArgs, format: OutputFormat) -> anyhow::Result<()> {
    let document = read_document(&args.path)?;
    let hash = content_hash(&document);
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "path": args.path.display().to_string(), "contentHash": hash })
        ),
        OutputFormat::Text => println!("{}  {}", hash.yellow(), args.path.display()),
    }
    Ok(())
}

/// Read a manuscript document: a JSON object keyed by section name.
fn read_document(path: &Path) -> anyhow::Result<Content> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let document: Content = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON object of sections", path.display()))?;
    debug!(path = %path.display(), sections = document.len(), "document loaded");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_document_objects() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ch2": "b", "ch1": {{"title": "One"}}}}"#).unwrap();
        let document = read_document(file.path()).unwrap();
        assert_eq!(document.len(), 2);
        assert!(canonical_content(&document).starts_with("{\n  \"ch1\""));
    }

    #[test]
    fn rejects_non_object_documents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(read_document(file.path()).is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = read_document(&path).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
