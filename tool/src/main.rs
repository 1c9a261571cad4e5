use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "leafweave")]
#[command(about = "Leaflet map trees to embeddable scripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a scene file into the host payload JSON.
    Render {
        scene: PathBuf,
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long, conflicts_with = "container_width")]
        width: Option<u32>,
        #[arg(long = "container-width")]
        container_width: bool,
        #[arg(long = "returned-object", value_name = "FIELD")]
        returned_object: Vec<String>,
        #[arg(long = "no-returned-objects", conflicts_with = "returned_object")]
        no_returned_objects: bool,
        #[arg(long)]
        hover: bool,
        #[arg(long)]
        pixelated: bool,
        #[arg(long = "max-drawn", value_name = "N")]
        max_drawn: Option<u32>,
        #[arg(long = "keep-old-drawn")]
        keep_old_drawn: bool,
        #[arg(long)]
        debug: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the content fingerprint of a script file.
    Hash {
        script: PathBuf,
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        hover: bool,
    },
}

fn init_tracing(debug: bool) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if debug {
        if let Ok(directive) = "leafweave::debug=info".parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            scene,
            key,
            height,
            width,
            container_width,
            returned_object,
            no_returned_objects,
            hover,
            pixelated,
            max_drawn,
            keep_old_drawn,
            debug,
            out,
        } => {
            init_tracing(debug);
            let args = cli::render::RenderArgs {
                key,
                height,
                width,
                container_width,
                returned_objects: returned_object,
                no_returned_objects,
                hover,
                pixelated,
                max_drawn,
                keep_old_drawn,
                debug,
                out,
            };
            if let Err(err) = cli::render::run(&scene, args) {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }
        Commands::Hash { script, key, hover } => {
            init_tracing(false);
            if let Err(err) = cli::hash::run(&script, key.as_deref(), hover) {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_flags_parse() {
        let cli = Cli::try_parse_from([
            "leafweave",
            "render",
            "scene.json",
            "--key",
            "k",
            "--returned-object",
            "zoom",
            "--returned-object",
            "bounds",
            "--max-drawn",
            "3",
            "--keep-old-drawn",
        ])
        .unwrap();
        match cli.command {
            Commands::Render {
                key,
                returned_object,
                max_drawn,
                keep_old_drawn,
                ..
            } => {
                assert_eq!(key.as_deref(), Some("k"));
                assert_eq!(returned_object, vec!["zoom", "bounds"]);
                assert_eq!(max_drawn, Some(3));
                assert!(keep_old_drawn);
            }
            Commands::Hash { .. } => panic!("expected render"),
        }
    }

    #[test]
    fn width_conflicts_with_container_width() {
        let parsed = Cli::try_parse_from([
            "leafweave",
            "render",
            "scene.json",
            "--width",
            "300",
            "--container-width",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn empty_returned_set_flag() {
        let cli = Cli::try_parse_from(["leafweave", "render", "scene.json", "--no-returned-objects"]).unwrap();
        match cli.command {
            Commands::Render {
                no_returned_objects,
                returned_object,
                ..
            } => {
                assert!(no_returned_objects);
                assert!(returned_object.is_empty());
            }
            Commands::Hash { .. } => panic!("expected render"),
        }

        let both = Cli::try_parse_from([
            "leafweave",
            "render",
            "scene.json",
            "--no-returned-objects",
            "--returned-object",
            "zoom",
        ]);
        assert!(both.is_err());
    }
}
