use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "noah",
    version,
    about = "Upload files to a Noah library server and repair their metadata"
)]
pub struct Cli {
    /// RON configuration file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = "noah.ron")]
    pub config: PathBuf,
    /// Server base URL, overriding the configuration file
    #[arg(long, global = true)]
    pub server: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Upload files as one batch and wait for the server's verdict
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Space separated tags (single-file uploads only)
        #[arg(long, default_value = "")]
        tags: String,
        /// Thumbnail image (single-file uploads only)
        #[arg(long)]
        thumb: Option<PathBuf>,
    },
    /// Fill in tags and thumbnails for untagged files named after an RJ code
    Repair {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        size: Option<u32>,
    },
    /// Print one page of the library
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        size: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_takes_files_tags_and_thumb() {
        let cli = Cli::parse_from([
            "noah",
            "--server",
            "http://media.local:8000/",
            "upload",
            "a.zip",
            "--tags",
            "voice asmr",
            "--thumb",
            "cover.png",
        ]);
        assert_eq!(cli.server.as_deref(), Some("http://media.local:8000/"));
        assert_eq!(cli.config, PathBuf::from("noah.ron"));
        assert_eq!(
            cli.command,
            Command::Upload {
                files: vec![PathBuf::from("a.zip")],
                tags: "voice asmr".to_string(),
                thumb: Some(PathBuf::from("cover.png")),
            }
        );
    }

    #[test]
    fn upload_needs_at_least_one_file() {
        assert!(Cli::try_parse_from(["noah", "upload"]).is_err());
    }

    #[test]
    fn repair_defaults_to_first_page() {
        let cli = Cli::parse_from(["noah", "repair", "--config", "other.ron"]);
        assert_eq!(cli.config, PathBuf::from("other.ron"));
        assert_eq!(
            cli.command,
            Command::Repair {
                page: 1,
                size: None
            }
        );
    }
}
