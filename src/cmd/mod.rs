pub mod export;
pub mod import;
pub mod report;
pub mod schema;
pub mod summary;
pub mod tax;
pub mod template;

use crate::core::{
    read_ledger_json, read_policy_json, read_settings_json, Currency, CurrencyContext, Ledger,
    PolicyBook, TaxSettings,
};
use anyhow::Context;
use chrono::NaiveDate;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Display currency: the ledger's own unless overridden on the command line.
pub fn currency_context(ledger: &Ledger, requested: Option<Currency>) -> CurrencyContext {
    let mut ctx = CurrencyContext::new(ledger.currency);
    let announce = ctx.subscribe(|c| log::info!("displaying amounts in {c}"));
    if let Some(requested) = requested {
        ctx.publish(requested);
    }
    ctx.unsubscribe(announce);
    ctx
}

/// Read the ledger JSON file; a missing file is an empty ledger.
pub fn read_ledger(path: &Path) -> anyhow::Result<Ledger> {
    if !path.exists() {
        log::info!("{} does not exist, starting an empty ledger", path.display());
        return Ok(Ledger::default());
    }
    let file = File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
    read_ledger_json(BufReader::new(file))
        .with_context(|| format!("invalid ledger file {}", path.display()))
}

pub fn write_ledger(path: &Path, ledger: &Ledger) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("unable to write {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    crate::core::write_ledger_json(ledger, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Settings are optional: without them the tax estimate is reported as not computable.
pub fn read_settings(path: Option<&Path>) -> anyhow::Result<Option<TaxSettings>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let file = File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
    match read_settings_json(BufReader::new(file)) {
        Ok(settings) => Ok(Some(settings)),
        Err(err) => {
            log::warn!("ignoring malformed settings {}: {err}", path.display());
            Ok(None)
        }
    }
}

pub fn read_policies(path: Option<&Path>) -> anyhow::Result<PolicyBook> {
    match path {
        None => Ok(PolicyBook::default()),
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
            read_policy_json(BufReader::new(file))
                .with_context(|| format!("invalid policy file {}", path.display()))
        }
    }
}

/// Open a file, or stdin for "-".
pub fn open_input(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        io::stdin().lock().read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
        }
        return Ok(Box::new(io::Cursor::new(buffer)));
    }
    let file = File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Write to a file, or stdout when no path is given.
pub fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        None => Ok(Box::new(io::stdout().lock())),
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("unable to write {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
