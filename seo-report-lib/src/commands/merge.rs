use super::Host;
use super::common::{LogLevel, init_logging};
use crate::Result;
use crate::store::ReportStore;
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// Workbook to copy rows from
    #[arg(value_name = "SOURCE")]
    pub source: Utf8PathBuf,

    /// Sheet of the source workbook to copy
    #[arg(value_name = "SHEET")]
    pub sheet: String,

    /// Workbook to copy rows into, created if it does not exist
    #[arg(value_name = "DEST")]
    pub dest: Utf8PathBuf,

    /// Name of the destination sheet (default is the source sheet's name)
    #[arg(long = "as", value_name = "NAME")]
    pub dest_sheet: Option<String>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

/// Appends every data row of a sheet to a sheet of another workbook
pub fn merge_sheet<H: Host>(host: &mut H, args: &MergeArgs) -> Result<()> {
    init_logging(args.log_level);

    let dest_sheet = args.dest_sheet.as_deref().unwrap_or(&args.sheet);

    let copied = ReportStore::new()
        .copy_sheet(&args.source, &args.sheet, &args.dest, dest_sheet)
        .into_app_err_with(|| format!("merging sheet '{}' of '{}' into '{}'", args.sheet, args.source, args.dest))?;

    let _ = writeln!(
        host.output(),
        "Copied {copied} row(s) from '{}' [{}] to '{}' [{dest_sheet}]",
        args.source,
        args.sheet,
        args.dest
    );

    Ok(())
}
