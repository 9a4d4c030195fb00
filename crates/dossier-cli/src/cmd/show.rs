//! `dsr show` — print the form values of a report and who is editing it.

use clap::Args;
use dossier_core::EditSession;
use dossier_core::validate::Field;
use serde_json::json;

use super::Context;
use crate::output::{pretty_kv, pretty_section, render};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Report ID.
    pub id: String,
}

pub fn run_show(args: &ShowArgs, ctx: &Context) -> anyhow::Result<()> {
    let gateway = ctx.gateway()?;
    let session = EditSession::open(gateway, &args.id, ctx.settings())
        .map_err(|e| ctx.fail(&e))?
        .with_me(ctx.me.clone());

    let values = session.initial_values();
    let editing: serde_json::Map<String, serde_json::Value> = Field::ALL
        .iter()
        .filter_map(|field| {
            let names: Vec<&str> = session
                .editors_of(*field)
                .into_iter()
                .map(|u| u.name.as_str())
                .collect();
            (!names.is_empty()).then(|| (field.as_str().to_string(), json!(names)))
        })
        .collect();

    let val = json!({
        "id": session.report().id,
        "values": values,
        "editing": editing,
    });

    render(ctx.output, &val, |v, w| {
        pretty_section(w, &format!("Report {}", v["id"].as_str().unwrap_or("")))?;
        let values = &v["values"];
        pretty_kv(w, "name", values["name"].as_str().unwrap_or(""))?;
        pretty_kv(w, "published", values["published"].as_str().unwrap_or(""))?;
        pretty_kv(w, "description", values["description"].as_str().unwrap_or(""))?;
        let author = values["createdByRef"]["label"]
            .as_str()
            .or_else(|| values["createdByRef"]["value"].as_str())
            .unwrap_or("-");
        pretty_kv(w, "author", author)?;
        let markings: Vec<&str> = values["markingDefinitions"]
            .as_array()
            .map(|a| a.iter().filter_map(|m| m["label"].as_str()).collect())
            .unwrap_or_default();
        pretty_kv(
            w,
            "markings",
            if markings.is_empty() {
                "-".to_string()
            } else {
                markings.join(", ")
            },
        )?;
        if let Some(editing) = v["editing"].as_object() {
            for (field, names) in editing {
                let names: Vec<&str> = names
                    .as_array()
                    .map(|a| a.iter().filter_map(|n| n.as_str()).collect())
                    .unwrap_or_default();
                writeln!(w, "  {field} is being edited by {}", names.join(", "))?;
            }
        }
        Ok(())
    })
}
