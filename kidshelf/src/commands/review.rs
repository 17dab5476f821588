//! `kidshelf review` - approve, edit, or reject assessed candidates.
//!
//! Interactive by default: each pending item is shown with its AI verdict and
//! the operator accepts, edits, rejects, or skips it. The reviewed file is
//! rewritten after every decision, so quitting mid-session loses nothing.
//! `--auto` accepts every verdict unattended.

use anyhow::{Context, Result};
use chrono::Utc;
use kidshelf_core::format::{format_age_label, parse_age_input};
use kidshelf_core::pipeline::review::{
    approve, auto_review, pending_items, ReviewDecision, ReviewForm,
};
use kidshelf_core::{AssessedItem, Config, SafetyRating, StagingStore, StimulationLevel};

use crate::prompt;

pub fn run(config: &Config, auto: bool) -> Result<()> {
    let store = StagingStore::new(config.staging_dir());
    let assessed = store.require_assessed()?;
    let mut reviewed = store.load_reviewed_or_empty()?;

    if auto {
        let approved = auto_review(&assessed, &reviewed, Utc::now());
        if approved.is_empty() {
            println!("Nothing pending review.");
            return Ok(());
        }
        let count = approved.len();
        reviewed.extend(approved);
        store
            .save_reviewed(&reviewed)
            .context("failed to save review output")?;

        tracing::info!(approved = count, "automated review complete");
        println!("Auto-approved {} item(s).", count);
        println!("Next: kidshelf import");
        return Ok(());
    }

    let pending = pending_items(&assessed, &reviewed);
    if pending.is_empty() {
        println!("Nothing pending review.");
        return Ok(());
    }

    println!("{} item(s) pending review.\n", pending.len());

    let mut approved = 0usize;
    let mut rejected = 0usize;
    let mut skipped = 0usize;

    for (index, item) in pending.iter().enumerate() {
        print_card(index + 1, pending.len(), item);

        let choice = prompt::line("[A]ccept / [E]dit / [R]eject / [S]kip: ")?;
        let decision = match choice.to_lowercase().as_str() {
            "" | "a" => ReviewDecision::Approved(approve(
                item,
                ReviewForm::from_assessment(&item.assessment),
                Utc::now(),
            )),
            "e" => {
                let form = edit_form(ReviewForm::from_assessment(&item.assessment))?;
                ReviewDecision::Approved(approve(item, form, Utc::now()))
            }
            "r" => ReviewDecision::Rejected,
            _ => ReviewDecision::Deferred,
        };

        match decision {
            ReviewDecision::Approved(record) => {
                reviewed.push(record);
                store.save_reviewed(&reviewed)?;
                approved += 1;
            }
            ReviewDecision::Rejected => rejected += 1,
            ReviewDecision::Deferred => skipped += 1,
        }

        let remaining = pending.len() - index - 1;
        if remaining > 0 && !prompt::confirm_or_yes(&format!("Continue ({} left)?", remaining))? {
            skipped += remaining;
            break;
        }
        println!();
    }

    println!(
        "Review session done: {} approved, {} rejected, {} left for later.",
        approved, rejected, skipped
    );
    tracing::info!(approved, rejected, skipped, "interactive review complete");
    if approved > 0 {
        println!("Next: kidshelf import");
    }
    Ok(())
}

fn print_card(position: usize, total: usize, item: &AssessedItem) {
    let e = &item.enriched;
    let a = &item.assessment;

    println!("--- {}/{} ---", position, total);
    println!(
        "{} ({}, {})",
        e.title,
        e.media_type.as_str(),
        e.release_year.as_deref().unwrap_or("year unknown")
    );
    if !e.genres.is_empty() {
        println!("Genres: {}", e.genres.join(", "));
    }
    if let Some(cert) = &e.certification {
        println!("Certification: {}", cert);
    }
    if !e.platforms.is_empty() {
        println!("Available on: {}", e.platforms.join(", "));
    }
    println!("Synopsis: {}", e.synopsis);
    println!();
    if item.flagged_for_review {
        println!("** flagged for mandatory review **");
    }
    println!(
        "AI verdict: {} | ages {}-{} | stimulation {}",
        a.rating.as_str(),
        format_age_label(a.min_age),
        format_age_label(a.max_age),
        a.stimulation_level.as_str()
    );
    let tags = a.suggested_tags();
    if !tags.is_empty() {
        println!("Tags: {}", tags.join(", "));
    }
    println!("Reasoning: {}", a.reasoning);
}

fn edit_form(mut form: ReviewForm) -> Result<ReviewForm> {
    let rating = prompt::line_or(
        &format!("Rating (Safe/Caution/Unsafe) [{}]: ", form.rating.as_str()),
        form.rating.as_str(),
    )?;
    if let Ok(parsed) = rating.parse::<SafetyRating>() {
        form.rating = parsed;
    }

    let min_age = prompt::line_or(
        &format!("Min age (years, or e.g. 6mo) [{}]: ", format_age_label(form.min_age)),
        &form.min_age.to_string(),
    )?;
    form.min_age = parse_age_input(&min_age);

    let max_age = prompt::line_or(
        &format!("Max age [{}]: ", format_age_label(form.max_age)),
        &form.max_age.to_string(),
    )?;
    form.max_age = parse_age_input(&max_age);

    let stimulation = prompt::line_or(
        &format!("Stimulation (Low/Medium/High) [{}]: ", form.stimulation_level.as_str()),
        form.stimulation_level.as_str(),
    )?;
    if let Ok(parsed) = stimulation.parse::<StimulationLevel>() {
        form.stimulation_level = parsed;
    }

    let tags = prompt::line(&format!("Tags, comma-separated [{}]: ", form.tags.join(", ")))?;
    if !tags.is_empty() {
        form.tags = tags
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }

    let reasoning = prompt::line("Reasoning (empty keeps AI text): ")?;
    if !reasoning.is_empty() {
        form.reasoning = reasoning;
    }

    form.featured = prompt::confirm("Feature this show?")?;
    Ok(form)
}
