//! Build automation tasks for hashbind

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for hashbind", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<hashbind::Cli>();

    let content = format!(
        r#"# hashbind CLI Reference

This page is generated from the CLI definition. To update it, run
`cargo run -p xtask -- generate-cli-docs`.

## Quick Start

```yaml
# config.yml
tableName: boards
directories:
  - /srv/boards/incoming
  - /srv/boards/archive
```

```bash
# See what would be submitted
hashbind scan

# Bind filenames in the catalog
hashbind run --workers 8
```

## Commands

{}

## Environment Variables

- `HASHBIND_CONFIG` - Configuration file (default: `config.yml`)
- `DATABASE_URL` - Catalog connection string, overrides `databaseUrl`
- `HASHBIND_WORKERS` - Fingerprint workers, overrides `workers`
- `HASHBIND_BATCH_SIZE` - Assignments per commit, overrides `batchSize`
- `HASHBIND_LOG_LEVEL`, `HASHBIND_LOG_OUTPUT`, `HASHBIND_LOG_FORMAT`, `HASHBIND_LOG_DIR`, `HASHBIND_LOG_FILTER` - Logging
- `RUST_LOG` - Standard tracing filter directives
"#,
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
