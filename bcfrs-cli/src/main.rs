mod loc;
mod view;

use anyhow::Result;
use clap::Command;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "bcfrs";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Read binary-encoded variant call (BCF) files.")
        .subcommand_required(true)
        .subcommand(view::cli::create_view_cli())
        .subcommand(loc::cli::create_loc_cli())
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // VIEW
        //
        Some((view::cli::VIEW_CMD, matches)) => {
            view::handlers::run_view(matches)?;
        }

        //
        // LOC
        //
        Some((loc::cli::LOC_CMD, matches)) => {
            loc::handlers::run_loc(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
