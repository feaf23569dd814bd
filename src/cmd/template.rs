//! Template command - write the CSV import template

use super::open_output;
use crate::core::write_template;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TemplateCommand {
    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl TemplateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let writer = open_output(self.output.as_deref())?;
        write_template(writer)?;
        if let Some(path) = &self.output {
            log::info!("template written to {}", path.display());
        }
        Ok(())
    }
}
