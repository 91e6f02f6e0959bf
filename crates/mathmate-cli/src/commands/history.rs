use anyhow::{Result, bail};
use mathmate_core::conversation::derive_session;
use mathmate_core::solve::SolveResult;

/// Prints all stored records, newest first.
pub fn list() -> Result<()> {
    let history = super::open_history()?;

    if history.list().is_empty() {
        println!("No history records.");
        return Ok(());
    }

    for record in history.list() {
        let question = if record.question_text.trim().is_empty() {
            "(image question)".to_string()
        } else {
            record.question_text.clone()
        };
        let outcome = match record.result.fail_reason() {
            Some(reason) => format!("failed: {reason}"),
            None => record.result.answer_text().to_string(),
        };
        println!(
            "{}  {}  [{}]  {} -> {}",
            record.id,
            record.created_at,
            record.mode.as_str(),
            question,
            outcome
        );
    }

    Ok(())
}

/// Replays one record: prints the reconstructed input snapshot, result,
/// and whether a fresh follow-up conversation would be available.
pub fn show(id: &str) -> Result<()> {
    let history = super::open_history()?;
    let Some(record) = history.find(id) else {
        bail!("no history record with id '{id}'");
    };

    println!("Question: {}", record.question_text);
    let padded = record.padded_options();
    if padded.iter().any(|o| !o.is_empty()) {
        for (i, option) in padded.iter().enumerate() {
            println!("  {i}. {option}");
        }
    }
    if record.image.is_some() {
        println!("(an image was attached)");
    }

    match &record.result {
        SolveResult::Mcq(r) => match &r.fail_reason {
            Some(reason) => println!("Failed: {reason}"),
            None => println!(
                "Answer: option {} ({}), {} = {}",
                r.answer_index, r.answer_text, r.normalized_expression, r.value
            ),
        },
        SolveResult::Essay(r) => match &r.fail_reason {
            Some(reason) => println!("Failed: {reason}"),
            None => println!("Answer: {}", r.answer),
        },
    }

    if !record.result.explanation().is_empty() {
        println!("\n{}", record.result.explanation());
    }

    let conversation = derive_session(&record.result, &record.question_text, &record.options);
    if conversation.is_some() {
        println!("\n(follow-up conversation available; live transcript starts empty)");
    }

    Ok(())
}

/// Removes one record by id. Removing a missing id is a no-op.
pub fn remove(id: &str) -> Result<()> {
    let mut history = super::open_history()?;
    history.remove(id)?;
    println!("Removed (if present): {id}");
    Ok(())
}

/// Removes all records.
pub fn clear() -> Result<()> {
    let mut history = super::open_history()?;
    history.clear()?;
    println!("History cleared.");
    Ok(())
}
