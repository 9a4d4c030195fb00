//! `dsr author` and `dsr markings` — change the created-by identity and the
//! marking definitions of a report.

use clap::Args;
use dossier_core::EditSession;
use dossier_core::model::SelectOption;
use dossier_core::reconcile::{EdgeStep, SingularAction};
use serde_json::{Value, json};

use super::Context;
use crate::output::render;

#[derive(Args, Debug)]
pub struct AuthorArgs {
    /// Report ID.
    pub id: String,

    /// Identity ID to set as author.
    pub identity: String,

    /// Display label for the identity (defaults to the ID).
    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Args, Debug)]
pub struct MarkingsArgs {
    /// Report ID.
    pub id: String,

    /// Marking definition IDs the report should carry. Omit to clear.
    pub markings: Vec<String>,
}

fn step_json(step: &EdgeStep) -> Value {
    match step {
        EdgeStep::Add { source, role } => json!({
            "op": "add",
            "source": source,
            "through": role.through,
        }),
        EdgeStep::Delete { relation_id } => json!({
            "op": "delete",
            "relation_id": relation_id,
        }),
    }
}

pub fn run_author(args: &AuthorArgs, ctx: &Context) -> anyhow::Result<()> {
    let gateway = ctx.gateway()?;
    let session =
        EditSession::open(gateway, &args.id, ctx.settings()).map_err(|e| ctx.fail(&e))?;

    let label = args.label.clone().unwrap_or_else(|| args.identity.clone());
    let action = session
        .change_created_by(SelectOption::new(label, args.identity.clone()))
        .map_err(|e| ctx.fail(&e))?;
    let (_, stats) = session.finish();

    let (kind, replaced) = match &action {
        SingularAction::NoOp => ("noop", None),
        SingularAction::Add { .. } => ("add", None),
        SingularAction::Replace { relation, .. } => ("replace", relation.clone()),
    };
    let val = json!({
        "ok": true,
        "id": args.id,
        "author": args.identity,
        "action": kind,
        "replaced_relation": replaced,
        "failed": stats.failed,
    });

    render(ctx.output, &val, |v, w| {
        let author = v["author"].as_str().unwrap_or("");
        match v["action"].as_str() {
            Some("noop") => writeln!(w, "✓ author unchanged ({author})"),
            Some("add") => writeln!(w, "✓ author set to {author}"),
            _ => writeln!(w, "✓ author replaced by {author}"),
        }?;
        if v["failed"].as_u64().unwrap_or(0) > 0 {
            writeln!(w, "  some remote calls failed, see logs")?;
        }
        Ok(())
    })
}

pub fn run_markings(args: &MarkingsArgs, ctx: &Context) -> anyhow::Result<()> {
    let gateway = ctx.gateway()?;
    let session =
        EditSession::open(gateway, &args.id, ctx.settings()).map_err(|e| ctx.fail(&e))?;

    let desired = session.select_markings(&args.markings);
    let change = session
        .change_markings(&desired)
        .map_err(|e| ctx.fail(&e))?;
    let (_, stats) = session.finish();

    let added: Vec<&str> = change.diff.to_add.iter().map(|a| a.value.as_str()).collect();
    let removed: Vec<&str> = change
        .diff
        .to_remove
        .iter()
        .map(|a| a.value.as_str())
        .collect();
    let steps: Vec<Value> = change.steps.iter().map(step_json).collect();
    let pending = added.len() + removed.len() - change.steps.len();

    let val = json!({
        "ok": true,
        "id": args.id,
        "added": added,
        "removed": removed,
        "steps": steps,
        "pending": pending,
        "failed": stats.failed,
    });

    render(ctx.output, &val, |v, w| {
        let list = |key: &str| -> String {
            v[key]
                .as_array()
                .map(|a| a.iter().filter_map(|x| x.as_str()).collect::<Vec<_>>().join(", "))
                .unwrap_or_default()
        };
        let steps = v["steps"].as_array().map_or(0, Vec::len);
        if steps == 0 {
            writeln!(w, "✓ markings unchanged")?;
            return Ok(());
        }
        writeln!(w, "✓ markings: +[{}] -[{}]", list("added"), list("removed"))?;
        let pending = v["pending"].as_u64().unwrap_or(0);
        if pending > 0 {
            writeln!(w, "  {pending} change(s) left for the next run (batch = first)")?;
        }
        Ok(())
    })
}
