use clap::{Parser, Subcommand};
use kg_index::Result;
use kg_index::commands::{
    build_index, delete_document, find_similar, list_documents, show_edges, show_keyword,
};
use kg_index::config::{Config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kg-index")]
#[command(about = "Build and query a knowledge-graph index over text documents")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml, docstore.db and index.json
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the configuration file, or show the current configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Index text files as documents
    Build {
        /// Text files to index
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Store chunks without running triplet extraction
        #[arg(long)]
        no_extract: bool,
        /// Embed every new triplet for similarity search
        #[arg(long)]
        embeddings: bool,
    },
    /// List the chunks indexed under a keyword
    Keyword {
        keyword: String,
    },
    /// List the edges leaving a subject
    Edges {
        subject: String,
        /// Follow edges this many hops and print relation paths
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Find the stored relations most similar to some text
    Similar {
        text: String,
        /// Number of relations to return
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
    /// List indexed documents
    Docs,
    /// Remove a document from the index
    Delete {
        /// Document ID as shown by `docs`
        doc_id: String,
        /// Leave the document's chunks in the docstore
        #[arg(long)]
        keep_chunks: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.base_dir {
        Some(dir) => Config::load(dir)?,
        None => Config::load_default()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config)?;
            } else {
                config.save()?;
                println!("Configuration written to {}", config.config_file_path().display());
            }
        }
        Commands::Build {
            files,
            no_extract,
            embeddings,
        } => {
            if no_extract {
                config.index.extract_triplets = false;
            }
            if embeddings {
                config.index.include_embeddings = true;
            }
            build_index(&config, &files).await?;
        }
        Commands::Keyword { keyword } => {
            show_keyword(&config, &keyword).await?;
        }
        Commands::Edges { subject, depth } => {
            show_edges(&config, &subject, depth).await?;
        }
        Commands::Similar { text, top_k } => {
            find_similar(&config, &text, top_k).await?;
        }
        Commands::Docs => {
            list_documents(&config).await?;
        }
        Commands::Delete {
            doc_id,
            keep_chunks,
        } => {
            delete_document(&config, &doc_id, keep_chunks).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["kg-index", "docs"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::Docs));
            assert!(parsed.base_dir.is_none());
        }
    }

    #[test]
    fn build_command_with_flags() {
        let cli = Cli::try_parse_from([
            "kg-index",
            "build",
            "a.txt",
            "b.txt",
            "--no-extract",
            "--embeddings",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Build {
                files,
                no_extract,
                embeddings,
            } = parsed.command
            {
                assert_eq!(files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
                assert!(no_extract);
                assert!(embeddings);
            } else {
                panic!("expected build command");
            }
        }
    }

    #[test]
    fn build_requires_files() {
        let cli = Cli::try_parse_from(["kg-index", "build"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn similar_defaults_top_k() {
        let cli = Cli::try_parse_from(["kg-index", "similar", "who founded Philz"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Similar { text, top_k } = parsed.command {
                assert_eq!(text, "who founded Philz");
                assert_eq!(top_k, 5);
            } else {
                panic!("expected similar command");
            }
        }
    }

    #[test]
    fn edges_with_depth() {
        let cli = Cli::try_parse_from(["kg-index", "edges", "Alice", "--depth", "2"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Edges { subject, depth } = parsed.command {
                assert_eq!(subject, "Alice");
                assert_eq!(depth, Some(2));
            } else {
                panic!("expected edges command");
            }
        }
    }

    #[test]
    fn global_base_dir() {
        let cli = Cli::try_parse_from(["kg-index", "delete", "notes.txt", "--base-dir", "/tmp/kg"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert_eq!(parsed.base_dir, Some(PathBuf::from("/tmp/kg")));
            if let Commands::Delete {
                doc_id,
                keep_chunks,
            } = parsed.command
            {
                assert_eq!(doc_id, "notes.txt");
                assert!(!keep_chunks);
            } else {
                panic!("expected delete command");
            }
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["kg-index", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["kg-index", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["kg-index", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
