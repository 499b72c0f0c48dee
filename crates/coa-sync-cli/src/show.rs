use std::fmt;
use std::io::IsTerminal as _;

use anstyle::{AnsiColor, Color, Style};
use anyhow::Result;
use coa_sync::reconcile::{Side, SkipReason, SyncConfig, SyncReport};
use coa_sync::source::SourceReader;
use coa_sync::target::{Ledger, TargetSystem};
use coa_sync::{AccountRecord, Status};

pub struct Palette {
    added: Style,
    different: Style,
    missing: Style,
    failed: Style,
    skipped: Style,
    heading: Style,
}

impl Palette {
    pub fn detect() -> Self {
        if std::io::stdout().is_terminal() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    fn colored() -> Self {
        let fg = |color| Style::new().fg_color(Some(Color::Ansi(color)));
        Palette {
            added: fg(AnsiColor::Green),
            different: fg(AnsiColor::Yellow),
            missing: fg(AnsiColor::Blue),
            failed: fg(AnsiColor::Red).bold(),
            skipped: fg(AnsiColor::Magenta),
            heading: Style::new().bold(),
        }
    }

    pub fn plain() -> Self {
        Palette {
            added: Style::new(),
            different: Style::new(),
            missing: Style::new(),
            failed: Style::new(),
            skipped: Style::new(),
            heading: Style::new(),
        }
    }

    fn status(&self, status: Status) -> Style {
        match status {
            Status::Added => self.added,
            Status::Different => self.different,
            Status::Missing => self.missing,
            Status::FailedToAdd => self.failed,
            Status::Unknown => self.skipped,
            Status::Unchanged => Style::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Nothing was written, so `Added` accounts are only pending.
    pub dry_run: bool,
    /// Also list unchanged accounts.
    pub all: bool,
}

pub fn show_sync(
    source: &dyn SourceReader,
    target: &mut dyn TargetSystem,
    sync: &SyncConfig,
    options: ReportOptions,
) -> Result<()> {
    let report = sync.run(source, target)?;

    let mut output = String::new();
    write_report(&mut output, &report, options, &Palette::detect())?;
    print!("{output}");

    Ok(())
}

pub fn show_accounts(ledger: &Ledger) -> Result<()> {
    let mut output = String::new();
    write_ledger(&mut output, ledger)?;
    print!("{output}");

    Ok(())
}

fn write_account(out: &mut impl fmt::Write, account: &AccountRecord) -> fmt::Result {
    write!(
        out,
        "{:<10} {:<6} {}",
        account.category, account.number, account.name
    )?;
    match &account.target_id {
        Some(id) => writeln!(out, " [{id}]"),
        None if account.status == Status::Added => writeln!(out, " (pending)"),
        None => writeln!(out),
    }
}

pub fn write_report(
    out: &mut impl fmt::Write,
    report: &SyncReport,
    options: ReportOptions,
    palette: &Palette,
) -> fmt::Result {
    let heading = palette.heading;

    let mut wrote_section = false;
    for account in report.accounts_by_status() {
        if account.status == Status::Unchanged && !options.all {
            continue;
        }
        let style = palette.status(account.status);
        write!(out, "{style}{:<11}{style:#} ", account.status)?;
        write_account(out, account)?;
        wrote_section = true;
    }

    if !report.skipped.is_empty() {
        let style = palette.skipped;
        if wrote_section {
            writeln!(out)?;
        }
        wrote_section = true;
        writeln!(out, "{style}━━━ Skipped ━━━{style:#}")?;
        for skipped in &report.skipped {
            let side = match skipped.side {
                Side::External => "source",
                Side::Target => "target",
            };
            let record = &skipped.record;
            match skipped.reason {
                SkipReason::EmptyName => writeln!(
                    out,
                    "  {side} account with number '{}' has no name",
                    record.number
                )?,
                SkipReason::DuplicateNumber => writeln!(
                    out,
                    "  {} not added, number {} is already in use",
                    record.name, record.number
                )?,
            }
        }
    }

    if !report.failures.is_empty() {
        let style = palette.failed;
        if wrote_section {
            writeln!(out)?;
        }
        wrote_section = true;
        writeln!(out, "{style}━━━ Failed ━━━{style:#}")?;
        for failure in &report.failures {
            writeln!(out, "  {}: {}", failure.name, failure.reason)?;
        }
    }

    let added = report.count(Status::Added);
    let failed = report.count(Status::FailedToAdd);
    let different = report.count(Status::Different);
    let missing = report.count(Status::Missing);
    let unchanged = report.count(Status::Unchanged);

    if wrote_section {
        writeln!(out)?;
    }
    if added + failed + different + missing == 0 && report.skipped.is_empty() {
        writeln!(out, "✓ Chart of accounts is in sync!")?;
        return Ok(());
    }

    writeln!(out, "{heading}━━━ Summary ━━━{heading:#}")?;
    if added > 0 {
        let style = palette.added;
        let verb = if options.dry_run { "to add" } else { "added" };
        writeln!(out, "  {style}{added}{style:#} account(s) {verb}")?;
    }
    if failed > 0 {
        let style = palette.failed;
        writeln!(out, "  {style}{failed}{style:#} account(s) failed to add")?;
    }
    if different > 0 {
        let style = palette.different;
        writeln!(
            out,
            "  {style}{different}{style:#} account(s) with a different category"
        )?;
    }
    if missing > 0 {
        let style = palette.missing;
        writeln!(
            out,
            "  {style}{missing}{style:#} account(s) only in the target"
        )?;
    }
    if !report.skipped.is_empty() {
        let style = palette.skipped;
        writeln!(
            out,
            "  {style}{}{style:#} record(s) skipped",
            report.skipped.len()
        )?;
    }
    writeln!(out, "  {unchanged} account(s) unchanged")?;

    Ok(())
}

pub fn write_ledger(out: &mut impl fmt::Write, ledger: &Ledger) -> fmt::Result {
    for account in ledger.accounts() {
        write!(
            out,
            "{:<8} {:<10} {:<6} {}",
            account.id, account.kind, account.number, account.name
        )?;
        match &account.description {
            Some(description) => writeln!(out, " ({description})")?,
            None => writeln!(out)?,
        }
    }
    writeln!(out, "{} account(s)", ledger.accounts().len())
}
