//! `dsr search` — look up autocomplete candidates.

use clap::{Args, Subcommand};
use dossier_core::model::SelectOption;

use super::Context;
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(subcommand)]
    pub target: SearchTarget,
}

#[derive(Subcommand, Debug)]
pub enum SearchTarget {
    /// Identities that can be set as author.
    Identities {
        /// Free-text search.
        text: String,
    },
    /// Marking definitions.
    Markings {
        /// Free-text search.
        text: String,
    },
}

pub fn run_search(args: &SearchArgs, ctx: &Context) -> anyhow::Result<()> {
    let gateway = ctx.gateway()?;
    let settings = ctx.settings();

    let result = match &args.target {
        SearchTarget::Identities { text } => {
            gateway.search_identities(text, settings.identities_page_size)
        }
        SearchTarget::Markings { text } => {
            gateway.search_marking_definitions(text, settings.markings_page_size)
        }
    };
    let options: Vec<SelectOption> = match result {
        Ok(options) => options,
        Err(e) => {
            render_error(ctx.output, &CliError::coded(e.to_string(), e.code()))?;
            return Err(e.into());
        }
    };

    render(ctx.output, &options, |opts, w| {
        if opts.is_empty() {
            return writeln!(w, "no match");
        }
        for opt in opts {
            writeln!(w, "{}  {}", opt.value, opt.label)?;
        }
        Ok(())
    })
}
