use clap::{Parser, Subcommand};
use console::style;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailforge::ai::provider::create_provider;
use mailforge::types::EmailStyle;
use mailforge::{ConfigLoader, GenerationRequest, GenerationService};

#[derive(Parser)]
#[command(name = "mailforge")]
#[command(
    version,
    about = "AI follow-up email template generator for CRM contacts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a follow-up email template for a contact
    Generate {
        #[arg(long, help = "Contact name")]
        name: String,
        #[arg(long, help = "Contact email address")]
        email: String,
        #[arg(long, help = "Contact company")]
        company: Option<String>,
        #[arg(long, help = "Contact role")]
        role: Option<String>,
        #[arg(long, help = "Contact priority label")]
        priority: Option<String>,
        #[arg(long, help = "Free-text notes about the contact")]
        notes: Option<String>,
        #[arg(long = "history", help = "Prior conversation entry (repeatable, oldest first)")]
        history: Vec<String>,
        #[arg(long, help = "Additional context for this generation")]
        context: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(EmailStyle), help = "Only generate one style: formal, casual")]
        style: Option<EmailStyle>,
        #[arg(long, help = "Emit the result as JSON")]
        json: bool,
    },

    /// Check provider connectivity and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Output as JSON instead of TOML")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n{}", style("━━━ PANIC ━━━").red().bold());
        eprintln!("{}", style("MailForge encountered an unexpected error:").red());
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "{}",
                style(format!(
                    "Location: {}:{}:{}",
                    location.file(),
                    location.line(),
                    location.column()
                ))
                .dim()
            );
        }

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Generate {
            name,
            email,
            company,
            role,
            priority,
            notes,
            history,
            context,
            style: requested_style,
            json,
        } => {
            let mut builder = GenerationRequest::builder(name, email).history(history);
            if let Some(company) = company {
                builder = builder.company(company);
            }
            if let Some(role) = role {
                builder = builder.role(role);
            }
            if let Some(priority) = priority {
                builder = builder.priority(priority);
            }
            if let Some(notes) = notes {
                builder = builder.notes(notes);
            }
            if let Some(context) = context {
                builder = builder.additional_context(context);
            }
            if let Some(style) = requested_style {
                builder = builder.style(style);
            }
            let request = builder.build();

            let rt = Runtime::new()?;
            rt.block_on(run_generate(request, requested_style, json))?;
        }
        Commands::Doctor => {
            let rt = Runtime::new()?;
            rt.block_on(run_doctor())?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => ConfigLoader::show_config(json)?,
            ConfigAction::Path => ConfigLoader::show_path(),
        },
    }

    Ok(())
}

async fn run_generate(
    request: GenerationRequest,
    requested_style: Option<EmailStyle>,
    json: bool,
) -> anyhow::Result<()> {
    let config = ConfigLoader::load()?;
    let service = GenerationService::from_config(&config)?;

    if let Some(style) = requested_style {
        let result = service.generate_one(&request).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_variant(&style.to_string(), &result.subject, &result.body);
            println!(
                "{}",
                style_meta(&result.provider_id, result.tokens_used)
            );
        }
        return Ok(());
    }

    let combined = service.generate_template(&request).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&combined)?);
    } else {
        print_variant("formal", &combined.formal.subject, &combined.formal.body);
        print_variant("casual", &combined.casual.subject, &combined.casual.body);
        println!(
            "{}",
            style_meta(&combined.provider_id, combined.total_tokens)
        );
    }
    Ok(())
}

fn print_variant(label: &str, subject: &str, body: &str) {
    println!("{}", style(format!("━━━ {} ━━━", label)).cyan().bold());
    println!("{} {}", style("Subject:").bold(), subject);
    println!();
    println!("{}", body);
    println!();
}

fn style_meta(provider: &str, tokens: u32) -> String {
    style(format!("provider: {}  tokens: {}", provider, tokens))
        .dim()
        .to_string()
}

async fn run_doctor() -> anyhow::Result<()> {
    let config = ConfigLoader::load()?;
    let provider_configs = config.llm.provider_configs();

    if provider_configs.is_empty() {
        println!(
            "{} no providers configured",
            style("✗").red()
        );
        println!("  Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or OLLAMA_HOST.");
        return Ok(());
    }

    println!("Checking {} provider(s):", provider_configs.len());
    for provider_config in &provider_configs {
        let provider = match create_provider(provider_config) {
            Ok(provider) => provider,
            Err(e) => {
                println!(
                    "  {} {} ({})",
                    style("✗").red(),
                    provider_config.provider,
                    e
                );
                continue;
            }
        };

        match provider.health_check().await {
            Ok(true) => println!(
                "  {} {} ({})",
                style("✓").green(),
                provider.name(),
                provider.model()
            ),
            Ok(false) => println!(
                "  {} {} responded with an error status",
                style("✗").red(),
                provider.name()
            ),
            Err(e) => println!("  {} {} ({})", style("✗").red(), provider.name(), e),
        }
    }

    Ok(())
}
