use clap::{Command, arg};

pub const LOC_CMD: &str = "loc";

pub fn create_loc_cli() -> Command {
    Command::new(LOC_CMD)
        .about("Print only the genomic interval of every record, skipping field decoding.")
        .arg(arg!(<BCF> "Input BCF file"))
}
