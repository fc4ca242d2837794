use anyhow::{Context, Result};
use clap::Parser;
use context_extractor::cli::{Cli, Commands};
use context_extractor::config::load_config_from;
use context_extractor::core::{ExtractionResult, Language};
use context_extractor::drivers::{LanguageDriver, OcamlDriver, TypeScriptDriver};
use context_extractor::extraction::{extract_context, ExtractionOptions};
use context_extractor::io::{create_writer, write_file, OutputFormat};
use context_extractor::lsp::spawn;
use context_extractor::observability::{install_panic_hook, set_phase, ExtractionPhase};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    install_panic_hook();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.command.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract {
            sketch,
            repo,
            language,
            server,
            format,
            output,
            verbosity: _,
        } => {
            handle_extract(ExtractRequest {
                sketch,
                repo,
                language,
                server,
                format,
                output,
            })
            .await
        }
    }
}

struct ExtractRequest {
    sketch: PathBuf,
    repo: Option<PathBuf>,
    language: Option<Language>,
    server: Option<String>,
    format: OutputFormat,
    output: Option<PathBuf>,
}

async fn handle_extract(request: ExtractRequest) -> Result<()> {
    let sketch = std::fs::canonicalize(&request.sketch)
        .with_context(|| format!("Sketch file not found: {}", request.sketch.display()))?;
    let sketch_dir = sketch
        .parent()
        .map(Path::to_path_buf)
        .context("Sketch has no parent directory")?;
    let repo_root = match &request.repo {
        Some(repo) => std::fs::canonicalize(repo)
            .with_context(|| format!("Repository root not found: {}", repo.display()))?,
        None => sketch_dir.clone(),
    };

    let config = load_config_from(&sketch_dir);
    let language = request
        .language
        .or(config.language)
        .or_else(|| Language::from_path(&sketch))
        .with_context(|| {
            format!(
                "Cannot infer the language of {}; pass --language",
                sketch.display()
            )
        })?;
    let command = request
        .server
        .clone()
        .unwrap_or_else(|| config.server_command.for_language(language).to_string());
    info!(language = %language, server = %command, "Starting extraction");

    let options = ExtractionOptions {
        repo_root: repo_root.clone(),
        ignore_patterns: config.ignore_patterns.clone(),
        include_hidden: config.include_hidden,
    };

    let result = match language {
        Language::TypeScript => {
            run_with_server(&TypeScriptDriver::new(), &command, &sketch, &options).await?
        }
        Language::OCaml => run_with_server(&OcamlDriver::new(), &command, &sketch, &options).await?,
    };

    let _phase = set_phase(ExtractionPhase::Output);
    write_result(&result, request.format, request.output.as_deref())
}

async fn run_with_server<D: LanguageDriver>(
    driver: &D,
    command: &str,
    sketch: &Path,
    options: &ExtractionOptions,
) -> Result<ExtractionResult> {
    let (client, mut child) = spawn(command, &options.repo_root)
        .with_context(|| format!("Failed to start language server `{command}`"))?;
    client
        .initialize(&options.repo_root)
        .await
        .context("Language server initialization failed")?;

    let result = extract_context(driver, &client, sketch, options).await;

    if let Err(e) = client.shutdown().await {
        warn!(error = %e, "Language server did not shut down cleanly");
        if let Err(e) = child.start_kill() {
            warn!(error = %e, "Failed to kill language server");
        }
    }
    match child.wait().await {
        Ok(status) => debug!(%status, "Language server exited"),
        Err(e) => warn!(error = %e, "Failed to wait for language server"),
    }

    Ok(result?)
}

fn write_result(result: &ExtractionResult, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let mut buffer = Vec::new();
    create_writer(format, &mut buffer).write_result(result)?;
    match output {
        Some(path) => {
            let text = String::from_utf8(buffer).context("Output is not valid UTF-8")?;
            write_file(path, &text)?;
            info!(path = %path.display(), "Wrote extraction result");
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&buffer)?;
        }
    }
    Ok(())
}
