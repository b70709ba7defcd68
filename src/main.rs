use anki_courier::config::TomlConfig;
use anki_courier::domain::model::{
    CardPreview, CardSubmission, ConfirmDecision, DeckPreset, DuplicateCandidate,
    SUPPORTED_MODELS,
};
use anki_courier::domain::ports::Confirmer;
use anki_courier::utils::validation::{self, Validate};
use anki_courier::utils::{error::ErrorSeverity, logger};
use anki_courier::{
    list_destinations, AnkiConnectClient, CliConfig, FileSlot, PresetStore, Result,
    SubmissionOutcome, SubmissionWorkflow,
};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "anki-courier")]
#[command(about = "Submit flashcards to a local Anki instance, with human approval")]
struct Cli {
    #[command(flatten)]
    config: CliConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the configured destination decks
    Decks,
    /// Show the confirmation preview for a submission without committing
    Preview(SubmitArgs),
    /// Submit a card; asks for approval before anything is written
    Submit(SubmitArgs),
    /// Manage destination presets
    Preset {
        #[command(subcommand)]
        command: PresetCommand,
    },
}

#[derive(Args)]
struct SubmitArgs {
    /// Destination deck id (see `decks`)
    #[arg(long)]
    deck_id: i64,

    /// Front content, light markup allowed
    #[arg(long)]
    front: String,

    /// Back content, light markup allowed
    #[arg(long)]
    back: String,

    /// Comma separated tags
    #[arg(long)]
    tags: Option<String>,
}

impl SubmitArgs {
    fn into_submission(self) -> CardSubmission {
        CardSubmission {
            deck_id: self.deck_id,
            front: self.front,
            back: self.back,
            tags: self.tags,
        }
    }
}

#[derive(Subcommand)]
enum PresetCommand {
    /// Add or overwrite the preset for one deck
    Add {
        #[arg(long)]
        deck_id: i64,
        #[arg(long)]
        deck_name: String,
        #[arg(long, default_value = "")]
        purpose: String,
        #[arg(long, default_value = "Basic")]
        model: String,
        #[arg(long, default_value = "")]
        front_guide: String,
        #[arg(long, default_value = "")]
        back_guide: String,
        #[arg(long, default_value = "")]
        front_example: String,
        #[arg(long, default_value = "")]
        back_example: String,
    },
    /// Remove the preset for one deck
    Remove {
        #[arg(long)]
        deck_id: i64,
    },
    /// List stored presets
    List,
}

/// 在終端機詢問使用者的三向確認
struct StdinConfirmer;

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, preview: &CardPreview) -> Result<ConfirmDecision> {
        println!("\n{}\n", preview.render());
        if preview.duplicates.is_empty() {
            print!("Create this note? [y]es / [n]o: ");
        } else {
            print!("[c]reate new / [u <note id>] update existing / [a]bort: ");
        }
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(parse_decision(line.trim(), &preview.duplicates))
    }
}

fn parse_decision(answer: &str, duplicates: &[DuplicateCandidate]) -> ConfirmDecision {
    let answer = answer.to_lowercase();
    match answer.as_str() {
        "y" | "yes" | "c" | "create" => return ConfirmDecision::CreateNew,
        _ => {}
    }
    if let Some(rest) = answer.strip_prefix('u') {
        let rest = rest.trim();
        if let Ok(note_id) = rest.parse::<i64>() {
            return ConfirmDecision::UpdateExisting(note_id);
        }
        // 只有一個候選時允許省略 id
        if rest.is_empty() && duplicates.len() == 1 {
            return ConfirmDecision::UpdateExisting(duplicates[0].note_id);
        }
    }
    ConfirmDecision::Cancel
}

fn print_preset(preset: &DeckPreset) {
    println!(
        "[{}] {} ({})",
        preset.deck_id, preset.deck_name, preset.model_name
    );
    if !preset.purpose.is_empty() {
        println!("    purpose: {}", preset.purpose);
    }
    if !preset.front_guide.is_empty() {
        println!(
            "    front: {} (e.g. {})",
            preset.front_guide, preset.front_example
        );
    }
    if !preset.back_guide.is_empty() {
        println!(
            "    back: {} (e.g. {})",
            preset.back_guide, preset.back_example
        );
    }
}

async fn run(mut cli: Cli) -> Result<i32> {
    if let Some(path) = cli.config.config.clone() {
        let file = TomlConfig::from_file(&path)?;
        file.validate()?;
        cli.config.apply_file(&file);
    }
    cli.config.validate()?;

    let store = PresetStore::new(FileSlot::new(cli.config.resolved_data_dir()));
    let client = AnkiConnectClient::with_timeout(
        cli.config.endpoint.clone(),
        Duration::from_secs(cli.config.timeout_seconds),
    );

    match cli.command {
        Command::Decks => {
            let decks = list_destinations(&store).await?;
            for preset in &decks {
                print_preset(preset);
            }
            Ok(0)
        }
        Command::Preview(args) => {
            let workflow = SubmissionWorkflow::new(&client, &store);
            let prepared = workflow.prepare(&args.into_submission()).await?;
            println!("{}", prepared.preview().render());
            Ok(0)
        }
        Command::Submit(args) => {
            let workflow = SubmissionWorkflow::new(&client, &store);
            let outcome = workflow.run(&args.into_submission(), &StdinConfirmer).await;
            match &outcome {
                SubmissionOutcome::Created(_) | SubmissionOutcome::Updated(_) => {
                    println!("✅ {}", outcome.message())
                }
                SubmissionOutcome::Cancelled => println!("🚫 {}", outcome.message()),
                SubmissionOutcome::Rejected(_) => println!("❌ {}", outcome.message()),
            }
            Ok(if matches!(outcome, SubmissionOutcome::Rejected(_)) {
                1
            } else {
                0
            })
        }
        Command::Preset { command } => match command {
            PresetCommand::Add {
                deck_id,
                deck_name,
                purpose,
                model,
                front_guide,
                back_guide,
                front_example,
                back_example,
            } => {
                validation::validate_positive_id("deck_id", deck_id)?;
                validation::validate_non_empty_string("deck_name", &deck_name)?;
                validation::validate_model_name("model", &model, SUPPORTED_MODELS)?;

                store
                    .upsert(DeckPreset {
                        deck_id,
                        deck_name: deck_name.clone(),
                        purpose,
                        model_name: model,
                        front_guide,
                        back_guide,
                        front_example,
                        back_example,
                    })
                    .await?;
                println!("✅ Saved preset for deck {} ({})", deck_id, deck_name);
                Ok(0)
            }
            PresetCommand::Remove { deck_id } => {
                if store.remove_by_id(deck_id).await? {
                    println!("✅ Removed preset for deck {}", deck_id);
                } else {
                    println!("No preset stored for deck {}", deck_id);
                }
                Ok(0)
            }
            PresetCommand::List => {
                let presets = store.get_all().await?;
                if presets.is_empty() {
                    println!("(no presets configured)");
                } else {
                    for preset in &presets {
                        print_preset(preset);
                    }
                }
                Ok(0)
            }
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.config.verbose);

    tracing::info!("Starting anki-courier CLI");
    if cli.config.verbose {
        tracing::debug!("CLI config: {:?}", cli.config);
    }

    match run(cli).await {
        Ok(exit_code) => {
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
