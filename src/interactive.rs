//! Interactive editing session
//!
//! A menu loop over the queue: pick an action, pick a record, see the queue
//! again. Failures are printed and the loop carries on.

use dialoguer::{Input, Select};
use nobg_common::{ArtifactSlot, CropRect, RecordStatus, RecordView};
use std::path::{Path, PathBuf};

use crate::dispatcher::SubmitOutcome;
use crate::error::{NobgError, Result};
use crate::remote::BackgroundRemover;
use crate::session::{CommandOutcome, QueueCommand, Session};

/// Menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ProcessAll,
    ProcessOne,
    Rotate,
    RotateResult,
    Crop,
    Remove,
    Save,
    Reset,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 9] = [
        MenuAction::ProcessAll,
        MenuAction::ProcessOne,
        MenuAction::Rotate,
        MenuAction::RotateResult,
        MenuAction::Crop,
        MenuAction::Remove,
        MenuAction::Save,
        MenuAction::Reset,
        MenuAction::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::ProcessAll => "Remove background from all",
            MenuAction::ProcessOne => "Remove background from one",
            MenuAction::Rotate => "Rotate image",
            MenuAction::RotateResult => "Rotate result",
            MenuAction::Crop => "Crop image",
            MenuAction::Remove => "Remove from queue",
            MenuAction::Save => "Save results",
            MenuAction::Reset => "Clear queue",
            MenuAction::Quit => "Quit",
        }
    }

    /// Status a record must have to be offered for this action
    pub fn target_status(&self) -> Option<RecordStatus> {
        match self {
            MenuAction::ProcessOne | MenuAction::Rotate | MenuAction::Crop => {
                Some(RecordStatus::Ready)
            }
            MenuAction::RotateResult => Some(RecordStatus::Done),
            _ => None,
        }
    }
}

pub async fn run_interactive<R: BackgroundRemover + Sync>(
    session: &Session<R>,
    out_dir: &Path,
) -> Result<()> {
    loop {
        let records = session.snapshot().await;
        if records.is_empty() {
            println!("Queue is empty");
            return Ok(());
        }
        print_queue(&records);

        let summary = session.summary().await;
        let actions: Vec<MenuAction> = MenuAction::ALL
            .into_iter()
            .filter(|a| *a != MenuAction::ProcessAll || summary.can_process_all())
            .collect();
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();

        let choice = Select::new()
            .with_prompt("Action")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(|e| NobgError::Interaction(e.to_string()))?;

        match run_action(session, actions[choice], &records, out_dir).await {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(e) => println!("⚠ {}\n", e),
        }
    }
}

/// Returns `false` when the session should end
async fn run_action<R: BackgroundRemover + Sync>(
    session: &Session<R>,
    action: MenuAction,
    records: &[RecordView],
    out_dir: &Path,
) -> Result<bool> {
    let command = match action {
        MenuAction::Quit => return Ok(false),
        MenuAction::Save => {
            let saved = session.save_all_results(out_dir).await?;
            print_saved(&saved);
            return Ok(true);
        }
        MenuAction::ProcessAll => QueueCommand::ProcessAll,
        MenuAction::Reset => QueueCommand::Reset,
        _ => {
            let Some(id) = pick_record(records, action.target_status())? else {
                return Ok(true);
            };
            match action {
                MenuAction::ProcessOne => QueueCommand::ProcessSingle(id),
                MenuAction::Rotate => QueueCommand::Rotate { id, slot: ArtifactSlot::Source },
                MenuAction::RotateResult => QueueCommand::Rotate { id, slot: ArtifactSlot::Result },
                MenuAction::Crop => QueueCommand::Crop { id, rect: prompt_crop_rect()? },
                _ => QueueCommand::Remove(id),
            }
        }
    };

    match session.execute(command).await? {
        CommandOutcome::Batch(report) => {
            println!("✔ {} done, {} failed\n", report.succeeded, report.failed);
        }
        CommandOutcome::Submitted(SubmitOutcome::Failed(error)) => println!("⚠ {}\n", error),
        CommandOutcome::Submitted(SubmitOutcome::Skipped) => println!("Not ready, skipped\n"),
        CommandOutcome::Reset => {
            println!("Queue cleared");
            return Ok(false);
        }
        _ => {}
    }
    Ok(true)
}

fn pick_record(
    records: &[RecordView],
    status: Option<RecordStatus>,
) -> Result<Option<nobg_common::RecordId>> {
    let candidates: Vec<&RecordView> = records
        .iter()
        .filter(|r| status.map_or(true, |s| r.status == s))
        .collect();
    if candidates.is_empty() {
        println!("No matching images\n");
        return Ok(None);
    }

    let labels: Vec<String> = candidates
        .iter()
        .map(|r| format!("{} {}", r.id, r.display_name))
        .collect();
    let choice = Select::new()
        .with_prompt("Image")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(|e| NobgError::Interaction(e.to_string()))?;
    Ok(Some(candidates[choice].id))
}

fn prompt_crop_rect() -> Result<CropRect> {
    let input: String = Input::new()
        .with_prompt("Crop (x,y,width,height)")
        .validate_with(|s: &String| s.parse::<CropRect>().map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()
        .map_err(|e| NobgError::Interaction(e.to_string()))?;
    Ok(input.parse::<CropRect>()?)
}

fn print_queue(records: &[RecordView]) {
    println!("---");
    for record in records {
        let marker = match record.status {
            RecordStatus::Ready => " ",
            RecordStatus::Processing => "…",
            RecordStatus::Done => "✔",
            RecordStatus::Error => "✖",
        };
        match (&record.status, &record.last_error) {
            (RecordStatus::Error, Some(error)) => {
                println!("{} {} {} ({})", marker, record.id, record.display_name, error)
            }
            _ => println!("{} {} {} [{}]", marker, record.id, record.display_name, record.status),
        }
    }
    println!("---");
}

fn print_saved(saved: &[PathBuf]) {
    if saved.is_empty() {
        println!("No finished results to save\n");
        return;
    }
    for path in saved {
        println!("✔ Saved {}", path.display());
    }
    println!();
}
