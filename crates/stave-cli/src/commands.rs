use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::{json, Value};
use stave_diff::{Diff, DiffLogic};
use stave_merge::{KindOutcome, MergedItem, ThreeWayMerge};
use stave_records::Timeline;
use stave_revision::{RevisionItem, VcsConfig};
use stave_store::InMemoryPayloadStore;
use stave_types::{ChangeKind, TrackedItem};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    debug!(?config, "loaded configuration");
    match cli.command {
        Command::Diff(args) => cmd_diff(args, cli.format),
        Command::Merge(args) => cmd_merge(args, cli.format),
        Command::Snapshot(args) => cmd_snapshot(args, &config, cli.format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<VcsConfig> {
    match path {
        Some(path) => Ok(VcsConfig::load(path)?),
        None => Ok(VcsConfig::default()),
    }
}

fn load_project(path: &Path) -> anyhow::Result<Timeline> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut timeline: Timeline = serde_json::from_str(&text)
        .with_context(|| format!("parsing project {}", path.display()))?;
    timeline.normalize();
    debug!(
        path = %path.display(),
        annotations = timeline.annotations.len(),
        time_signatures = timeline.time_signatures.len(),
        key_signatures = timeline.key_signatures.len(),
        "loaded project"
    );
    Ok(timeline)
}

fn write_project(path: &Path, timeline: &Timeline) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(timeline)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn diff_projects(baseline: &Timeline, target: &Timeline) -> anyhow::Result<Diff> {
    Ok(DiffLogic::default().create_diff(target, baseline)?)
}

/// Merge `target` into `ancestor`, returning the merge and the merged
/// project.
fn merge_projects(ancestor: &Timeline, target: &Timeline) -> anyhow::Result<(MergedItem, Timeline)> {
    let logic = DiffLogic::default();
    let merged = logic.merge_items(ancestor, target)?;
    let mut project = ancestor.clone();
    logic.apply_to_item(&mut project, &merged.diff)?;
    Ok((merged, project))
}

fn snapshot_project(project: &Timeline, dedup: bool) -> anyhow::Result<Value> {
    let item = RevisionItem::from_tracked(project);
    if dedup {
        let store = InMemoryPayloadStore::new();
        let node = item.serialize(Some(&store))?;
        Ok(json!({
            "revisionItem": serde_json::to_value(&node)?,
            "payloads": serde_json::to_value(store.export()?)?,
        }))
    } else {
        let node = item.serialize(None)?;
        Ok(json!({ "revisionItem": serde_json::to_value(&node)? }))
    }
}

fn diff_json(diff: &Diff) -> Value {
    let entries: Vec<Value> = diff
        .iter()
        .map(|e| {
            json!({
                "deltaType": e.delta.delta_type.to_string(),
                "count": e.delta.count,
                "summary": e.delta.summary(),
            })
        })
        .collect();
    Value::Array(entries)
}

fn change_marker(change: ChangeKind) -> colored::ColoredString {
    match change {
        ChangeKind::Added => "+".green(),
        ChangeKind::Removed => "-".red(),
        ChangeKind::Changed => "~".yellow(),
        ChangeKind::Full | ChangeKind::Merged => "=".cyan(),
    }
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let baseline = load_project(&args.baseline)?;
    let target = load_project(&args.target)?;
    let diff = diff_projects(&baseline, &target)?;

    match format {
        OutputFormat::Json => println!("{}", diff_json(&diff)),
        OutputFormat::Text => {
            if diff.is_empty() {
                println!("No changes.");
            }
            for entry in &diff {
                println!("  {} {}", change_marker(entry.change()), entry.delta.summary());
            }
        }
    }
    Ok(())
}

fn cmd_merge(args: MergeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ancestor = load_project(&args.ancestor)?;
    let target = load_project(&args.target)?;
    let (merged, project) = merge_projects(&ancestor, &target)?;

    if let Some(output) = &args.output {
        write_project(output, &project)?;
    }

    match format {
        OutputFormat::Json => {
            let report = serde_json::to_value(&merged.report)?;
            println!("{}", json!({ "merged": diff_json(&merged.diff), "report": report }));
        }
        OutputFormat::Text => {
            for (kind, outcome) in &merged.report.kinds {
                let outcome = match outcome {
                    KindOutcome::Skipped => outcome.to_string().red(),
                    KindOutcome::Adopted { .. } => outcome.to_string().green(),
                    _ => outcome.to_string().normal(),
                };
                println!("  {:<16} {}", kind.as_str().bold(), outcome);
            }
            for entry in &merged.diff {
                println!("  {} {}", change_marker(entry.change()), entry.delta.summary());
            }
            let target_name = target.vcs_name();
            match &args.output {
                Some(output) => println!(
                    "{} Merged {} into {}",
                    "✓".green().bold(),
                    target_name.yellow(),
                    output.display()
                ),
                None => println!("{} Merged {}.", "✓".green(), target_name.yellow()),
            }
        }
    }
    Ok(())
}

fn cmd_snapshot(args: SnapshotArgs, config: &VcsConfig, format: OutputFormat) -> anyhow::Result<()> {
    let project = load_project(&args.project)?;
    let snapshot = snapshot_project(&project, args.dedup || config.dedup_payloads)?;
    match format {
        OutputFormat::Json => println!("{snapshot}"),
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(&snapshot)?),
    }
    Ok(())
}
