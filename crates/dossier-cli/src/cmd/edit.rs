//! `dsr patch` and `dsr focus` — autosave one field, announce focus.
//!
//! Neither command fetches the report: both only need its id. Remote
//! failures are counted in the output but do not fail the command.

use clap::Args;
use dossier_core::model::ReportSnapshot;
use dossier_core::validate::Field;
use dossier_core::{EditSession, SubmitOutcome};
use serde_json::json;

use super::Context;
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Report ID.
    pub id: String,

    /// Field to save: name, published or description.
    pub field: String,

    /// New value.
    pub value: String,
}

#[derive(Args, Debug)]
pub struct FocusArgs {
    /// Report ID.
    pub id: String,

    /// Field now being edited.
    pub field: String,
}

fn parse_field(raw: &str, ctx: &Context) -> anyhow::Result<Field> {
    match raw.parse::<Field>() {
        Ok(field) => Ok(field),
        Err(e) => {
            render_error(
                ctx.output,
                &CliError {
                    message: e.to_string(),
                    suggestion: Some(e.suggestion.clone()),
                    error_code: Some(e.code.code().to_string()),
                },
            )?;
            anyhow::bail!("{}", e);
        }
    }
}

pub fn run_patch(args: &PatchArgs, ctx: &Context) -> anyhow::Result<()> {
    let field = parse_field(&args.field, ctx)?;
    let gateway = ctx.gateway()?;
    let session = EditSession::new(gateway, ReportSnapshot::empty(&args.id), ctx.settings())
        .map_err(|e| ctx.fail(&e))?;

    let outcome = session
        .submit_field(field, &args.value)
        .map_err(|e| ctx.fail(&e))?;
    let (_, stats) = session.finish();

    let val = match outcome {
        SubmitOutcome::Dispatched => json!({
            "ok": true,
            "id": args.id,
            "field": field.as_str(),
            "status": "dispatched",
            "failed": stats.failed,
        }),
        SubmitOutcome::Skipped(reason) => json!({
            "ok": true,
            "id": args.id,
            "field": field.as_str(),
            "status": "skipped",
            "reason": reason.reason,
        }),
    };

    render(ctx.output, &val, |v, w| {
        let field = v["field"].as_str().unwrap_or("");
        match v["status"].as_str() {
            Some("skipped") => writeln!(
                w,
                "skipped {field}: {}",
                v["reason"].as_str().unwrap_or("invalid value")
            ),
            _ if v["failed"].as_u64().unwrap_or(0) > 0 => {
                writeln!(w, "✓ {field} sent (remote call failed, see logs)")
            }
            _ => writeln!(w, "✓ {field} saved"),
        }
    })
}

pub fn run_focus(args: &FocusArgs, ctx: &Context) -> anyhow::Result<()> {
    let field = parse_field(&args.field, ctx)?;
    let gateway = ctx.gateway()?;
    let session = EditSession::new(gateway, ReportSnapshot::empty(&args.id), ctx.settings())
        .map_err(|e| ctx.fail(&e))?;

    session.change_focus(field).map_err(|e| ctx.fail(&e))?;
    let (_, stats) = session.finish();

    let val = json!({
        "ok": true,
        "id": args.id,
        "focus_on": field.as_str(),
        "failed": stats.failed,
    });
    render(ctx.output, &val, |v, w| {
        writeln!(w, "✓ focus on {}", v["focus_on"].as_str().unwrap_or(""))
    })
}
