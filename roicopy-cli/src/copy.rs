// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use clap::Args;
use colored::Colorize;

use roicopy_core::constant::{POINT_STRIDE, ROI_PAGE_SIZE};
use roicopy_core::error::RoiCopyError;
use roicopy_core::pipeline::PipelineOptions;
use roicopy_core::ut::track::progress_log;
use roicopy_data::locator::Locator;
use roicopy_data::session;
use roicopy_data::store::{OmeroClient, OmeroLogin};
use roicopy_data::transfer::{RoiTransfer, TransferOptions, TransferReport};

#[derive(Debug, Args)]
pub struct CopyArgs {
    #[arg(help = "Target server username.")]
    pub target_username: String,

    #[arg(help = "Target server password.")]
    pub target_password: String,

    #[arg(help = "Target OMERO.web host or url.")]
    pub target_server: String,

    #[arg(help = "Copy ROIs from this Image:<id> or Dataset:<id>.")]
    pub source: String,

    #[arg(help = "Copy ROIs to this Image:<id> or Dataset:<id>.")]
    pub target: String,

    #[arg(long, default_value_t = ROI_PAGE_SIZE, help = "Number of ROIs read per request.")]
    pub page_size: usize,

    #[arg(long, default_value_t = POINT_STRIDE, help = "Keep every nth contour point.")]
    pub stride: usize,

    #[arg(long, help = "Convert masks without saving any ROIs.")]
    pub dry_run: bool,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

pub fn copy(args: &CopyArgs) {
    match run_copy(args) {
        Ok(report) => {
            let prefix = if args.dry_run { "Dry run complete." } else { "Complete." };
            println!("{} {}", prefix.green().bold(), report.summary());

            if !report.unmatched.is_empty() {
                println!(
                    "{} source images had no target with the same name.",
                    report.unmatched.len()
                );
            }
        }
        Err(err) => {
            eprintln!("[roicopy::copy] ERROR: {}", err);
            std::process::exit(1);
        }
    }
}

/// Validate arguments, open both sessions and copy
///
/// Both clients are dropped, and so logged out, before this returns.
pub fn run_copy(args: &CopyArgs) -> Result<TransferReport, RoiCopyError> {
    let options = transfer_options(args)?;

    let source_locator: Locator = args.source.parse()?;
    let target_locator: Locator = args.target.parse()?;

    let source_login = session::source_login_from_env()?;
    let target_login = OmeroLogin {
        server: args.target_server.clone(),
        username: args.target_username.clone(),
        password: args.target_password.clone(),
        server_id: session::server_id_from_env()?,
    };

    progress_log(
        &format!("Connecting to source {}.", source_login.base_url()),
        args.verbose,
    );
    let source = OmeroClient::connect(&source_login)?;

    progress_log(
        &format!("Connecting to target {}.", target_login.base_url()),
        args.verbose,
    );
    let target = OmeroClient::connect(&target_login)?;

    let report = RoiTransfer::new(&source, &target, options).run(&source_locator, &target_locator)?;

    target.close()?;
    source.close()?;

    Ok(report)
}

fn transfer_options(args: &CopyArgs) -> Result<TransferOptions, RoiCopyError> {
    if args.page_size < 1 {
        return Err(RoiCopyError::ConfigError(
            "--page-size must be a positive integer".to_string(),
        ));
    }

    if args.stride < 1 {
        return Err(RoiCopyError::ConfigError(
            "--stride must be a positive integer".to_string(),
        ));
    }

    Ok(TransferOptions {
        page_size: args.page_size,
        pipeline: PipelineOptions {
            stride: args.stride,
            ..PipelineOptions::default()
        },
        dry_run: args.dry_run,
        verbose: args.verbose,
    })
}
