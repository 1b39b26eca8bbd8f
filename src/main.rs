use anyhow::{Context, Result};
use clap::{Args, FromArgMatches, crate_version};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use env_logger::Builder;

use ebi_align::ebi_framework::ebi_command::EBI_COMMANDS;

pub fn main() -> Result<()> {
    let command = EBI_COMMANDS.build_cli();
    let command = Verbosity::<WarnLevel>::augment_args(command.version(crate_version!()));
    let cli_matches = command.get_matches();

    let verbosity = Verbosity::<WarnLevel>::from_arg_matches(&cli_matches)?;
    Builder::new()
        .filter_level(verbosity.log_level_filter())
        .init();

    log::info!("ebi-align starting");

    EBI_COMMANDS.execute(&cli_matches).context("executing ebi-align")
}
