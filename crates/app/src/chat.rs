//! Line-oriented chat loop: extract, normalize, confirm, record.
//!
//! All user-visible messaging lives here; the engine only returns values.
//! Each message is handled through a request-scoped [`Draft`], so nothing
//! about a pending movement outlives the interaction that produced it.

use std::io::Write;

use engine::{Engine, Movement, SourceKind, SourceRecord};
use extractor::Extractor;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Reader = Lines<BufReader<Stdin>>;
type Fallible = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Pipeline state for one chat message.
struct Draft {
    raw: serde_json::Value,
    movement: Option<Movement>,
    accepted: bool,
}

pub async fn run(engine: Engine, extractor: Extractor, owner: &str) -> Fallible {
    println!("finbot - describe a transaction, or type /help");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();

        match line.split_whitespace().next() {
            None => {}
            Some("/quit") | Some("/q") => break,
            Some("/help") => help(),
            Some("/sources") => show_sources(&engine, owner).await?,
            Some("/categories") => show_categories(&engine, owner).await?,
            Some("/history") => show_history(&engine, owner).await?,
            Some("/totals") => show_totals(&engine, owner).await?,
            Some("/wallet") => add_wallet(&engine, owner, &line).await?,
            Some(command) if command.starts_with('/') => {
                println!("unknown command: {command}");
            }
            Some(_) => handle_message(&engine, &extractor, owner, &line, &mut lines).await?,
        }

        prompt()?;
    }

    Ok(())
}

async fn handle_message(
    engine: &Engine,
    extractor: &Extractor,
    owner: &str,
    text: &str,
    lines: &mut Reader,
) -> Fallible {
    let known = engine.source_names(owner).await?;
    let raw = match extractor.extract(text, &known).await {
        Ok(raw) => raw,
        Err(err) => {
            println!("could not extract a transaction: {err}");
            return Ok(());
        }
    };

    let mut draft = Draft {
        raw,
        movement: None,
        accepted: false,
    };

    match engine.normalize(draft.raw.clone(), owner).await {
        Ok(movement) => {
            show_movement(&movement);
            draft.movement = Some(movement);
        }
        Err(err) => {
            println!("that does not look recordable: {err}");
            return Ok(());
        }
    }

    print!("record it? [y/N] ");
    std::io::stdout().flush()?;
    if let Some(answer) = lines.next_line().await? {
        draft.accepted = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");
    }

    match (draft.accepted, draft.movement) {
        (true, Some(movement)) => match engine.record(&movement).await {
            Ok(record) => println!(
                "recorded. {} balance: {}",
                record.name,
                format_minor(record.balance_minor)
            ),
            Err(err) => println!("recording failed: {err}"),
        },
        _ => println!("discarded."),
    }

    Ok(())
}

async fn add_wallet(engine: &Engine, owner: &str, line: &str) -> Fallible {
    let mut parts = line.split_whitespace().skip(1);
    let (name, kind, balance) = match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(kind), Some(balance)) => (name, kind, balance),
        _ => {
            println!("usage: /wallet <name> <cash|debit_card|credit_card|voucher> <balance> [last-digits]");
            return Ok(());
        }
    };
    let last_digits = parts.next();

    let kind = match SourceKind::try_from(kind.to_ascii_lowercase().as_str()) {
        Ok(kind) => kind,
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    };
    let balance_minor = match balance.parse::<f64>() {
        Ok(value) if value.is_finite() => (value * 100.0).round() as i64,
        _ => {
            println!("invalid balance: {balance}");
            return Ok(());
        }
    };

    match engine
        .create_source(owner, name, kind, last_digits, balance_minor)
        .await
    {
        Ok(record) => println!(
            "added {} ({}) with balance {}",
            record.name,
            record.kind.as_str(),
            format_minor(record.balance_minor)
        ),
        Err(err) => println!("could not add the wallet: {err}"),
    }

    Ok(())
}

async fn show_sources(engine: &Engine, owner: &str) -> Fallible {
    let records = engine.sources(owner).await?;
    if records.is_empty() {
        println!("no sources yet; add one with /wallet or just record a movement");
        return Ok(());
    }
    for record in records {
        show_source(&record);
    }
    Ok(())
}

fn show_source(record: &SourceRecord) {
    let digits = record
        .last_digits
        .as_deref()
        .map(|digits| format!(" *{digits}"))
        .unwrap_or_default();
    println!(
        "{} ({}){digits}: {}",
        record.name,
        record.kind.as_str(),
        format_minor(record.balance_minor)
    );
}

async fn show_categories(engine: &Engine, owner: &str) -> Fallible {
    let categories = engine.categories(owner).await?;
    if categories.is_empty() {
        println!("no categories yet");
    } else {
        println!("{}", categories.join(", "));
    }
    Ok(())
}

async fn show_history(engine: &Engine, owner: &str) -> Fallible {
    let movements = engine.recent_movements(owner, 20).await?;
    if movements.is_empty() {
        println!("no movements yet");
        return Ok(());
    }
    for movement in movements {
        let local = movement.occurred_at.with_timezone(&engine::REFERENCE_ZONE);
        println!(
            "{} {:7} {:>10}  {} [{}] via {}",
            local.format("%Y-%m-%d %H:%M"),
            movement.kind.as_str(),
            format_minor(movement.amount_minor),
            movement.name,
            movement.category,
            movement.source_name,
        );
    }
    Ok(())
}

async fn show_totals(engine: &Engine, owner: &str) -> Fallible {
    let (income, expenses) = engine.totals(owner).await?;
    println!(
        "income {} / expenses {} / net {}",
        format_minor(income),
        format_minor(expenses),
        format_minor(income - expenses)
    );
    Ok(())
}

fn show_movement(movement: &Movement) {
    let local = movement.occurred_at.with_timezone(&engine::REFERENCE_ZONE);
    println!(
        "{}: {} {} [{}] via {} ({}) at {}",
        movement.kind.as_str(),
        movement.name,
        format_minor(movement.amount_minor),
        movement.category,
        movement.source_name,
        movement.source_kind.as_str(),
        local.format("%Y-%m-%d %H:%M:%S"),
    );
    if !movement.description.is_empty() {
        println!("  {}", movement.description);
    }
}

fn help() {
    println!("describe a transaction in plain words to record it, or:");
    println!("  /wallet <name> <kind> <balance> [last-digits]  add a source");
    println!("  /sources      list sources and balances");
    println!("  /categories   list known categories");
    println!("  /history      recent movements");
    println!("  /totals       income and expense totals");
    println!("  /quit         exit");
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

fn format_minor(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_minor_handles_signs() {
        assert_eq!(format_minor(0), "$0.00");
        assert_eq!(format_minor(450), "$4.50");
        assert_eq!(format_minor(-450), "-$4.50");
        assert_eq!(format_minor(100_005), "$1000.05");
    }
}
