use clap::Parser;
use md5tor::{Error, app};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Takes exactly two paths and no options, so file names starting with '-' are plain paths.
#[derive(Parser)]
#[command(about, long_about = None, disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Path to the .torrent file
    #[arg(allow_hyphen_values = true)]
    torrent: PathBuf,

    /// Folder containing the torrent content
    #[arg(allow_hyphen_values = true)]
    directory: PathBuf,
}

fn halt(error: Error) -> ExitCode {
    eprintln!("{error}");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return halt(Error::Arguments(e.render().to_string().trim_end().to_owned())),
    };

    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Off)
        .with_module_level("md5tor", log::LevelFilter::Warn)
        // .with_module_level("md5tor", log::LevelFilter::Debug)
        .init()
    {
        return halt(Error::Output(io::Error::other(e)));
    }

    let config = app::Config::new(cli.torrent, cli.directory);
    match app::run(&config, &mut io::stdout().lock()) {
        Ok(outcome) => {
            log::info!(
                "{} files processed, metainfo {}",
                outcome.files_processed,
                if outcome.written { "updated" } else { "unchanged" }
            );
            ExitCode::SUCCESS
        }
        Err(e) => halt(e),
    }
}
