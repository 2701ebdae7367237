// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use clap::Parser;
use roicopy_cli::copy;

/// Copy mask ROIs from a source OMERO image or dataset to a target as polygons.
///
/// The source server is read with the credentials in ROICOPY_SOURCE_SERVER,
/// ROICOPY_SOURCE_USERNAME and ROICOPY_SOURCE_PASSWORD. Targets that already
/// have ROIs are skipped.
#[derive(Parser)]
#[command(version, about, long_about)]
struct Cli {
    #[command(flatten)]
    copy: copy::CopyArgs,
}

fn main() {
    let cli = Cli::parse();
    copy::copy(&cli.copy);
}
