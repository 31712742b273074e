use clap::{Command, arg};

pub const VIEW_CMD: &str = "view";

pub fn create_view_cli() -> Command {
    Command::new(VIEW_CMD)
        .about("Decode records and print one line per variant.")
        .arg(arg!(<BCF> "Input BCF file"))
        .arg(
            arg!(--region <REGION> "Restrict output to chr:start-end (requires a .csi index)")
                .required(false),
        )
}
