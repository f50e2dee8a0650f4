//! `fishy` command-line front end.
//!
//! # Responsibility
//! - Resolve configuration, start logging, open the catalog once.
//! - Map subcommands onto `CatalogService` use-cases and print results.
//!
//! Exit codes: `0` success, `1` not found or rejected input, `2` storage or
//! configuration failure.

use clap::{Args, Parser, Subcommand};
use fishy_core::{
    init_logging, open_db, validate_fish_data, CatalogConfig, CatalogService,
    CatalogServiceError, FishChangeOutcome, FishId, FishPayload, NewFishOutcome, RejectedFish,
    RepoError, SqliteFishRepository, SqliteSpeciesRepository,
};
use log::error;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_REJECTED: u8 = 1;
const EXIT_STORAGE: u8 = 2;

#[derive(Parser)]
#[command(name = "fishy", about = "Fish species catalog", version)]
struct Cli {
    /// SQLite file to open (overrides FISHY_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log level (overrides FISHY_LOG_LEVEL).
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files (overrides FISHY_LOG_DIR).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Species index, detail and creation.
    Species {
        #[command(subcommand)]
        command: SpeciesCommand,
    },
    /// Fish records within a species.
    Fish {
        #[command(subcommand)]
        command: FishCommand,
    },
}

#[derive(Subcommand)]
enum SpeciesCommand {
    /// List every species.
    List,
    /// Show one species with its fish.
    Show { id: String },
    /// Register a species under a URL-safe id.
    Add { id: String, name: String },
}

#[derive(Subcommand)]
enum FishCommand {
    /// Add a fish to a species.
    Add {
        species: String,
        #[command(flatten)]
        fields: FishFields,
    },
    /// Show one fish of a species.
    Show { species: String, fish_id: FishId },
    /// Replace name, description and habitat of a fish.
    Edit {
        species: String,
        fish_id: FishId,
        #[command(flatten)]
        fields: FishFields,
    },
    /// Delete a fish.
    Delete { species: String, fish_id: FishId },
    /// Check a JSON payload without touching the database.
    Validate { payload: String },
}

#[derive(Args)]
struct FishFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    habitat: Option<String>,
}

impl FishFields {
    fn into_payload(self) -> FishPayload {
        let pairs = [
            ("name", self.name),
            ("description", self.description),
            ("habitat", self.habitat),
        ];
        FishPayload::from_pairs(
            pairs
                .into_iter()
                .filter_map(|(key, value)| value.map(|value| (key, value))),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = resolve_config(&cli, CatalogConfig::from_env());

    if let Some(log_dir) = config.log_dir.as_ref() {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("fishy: {err}");
            return ExitCode::from(EXIT_STORAGE);
        }
    }

    if let Command::Fish {
        command: FishCommand::Validate { payload },
    } = &cli.command
    {
        return validate_payload(payload, cli.json);
    }

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!(
                "fishy: cannot open catalog `{}`: {err}",
                config.db_path.display()
            );
            return ExitCode::from(EXIT_STORAGE);
        }
    };

    let service = match (
        SqliteSpeciesRepository::try_new(&conn),
        SqliteFishRepository::try_new(&conn),
    ) {
        (Ok(species), Ok(fish)) => CatalogService::new(species, fish),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("fishy: {err}");
            return ExitCode::from(EXIT_STORAGE);
        }
    };

    match run(&service, cli.command, cli.json) {
        Ok(code) => code,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("fishy: {err}");
            ExitCode::from(exit_status(&err))
        }
    }
}

/// Applies command-line flags on top of the environment-derived config.
fn resolve_config(cli: &Cli, mut config: CatalogConfig) -> CatalogConfig {
    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    if let Some(dir) = cli.log_dir.clone() {
        config.log_dir = Some(dir);
    }
    config
}

fn exit_status(err: &CatalogServiceError) -> u8 {
    match err {
        CatalogServiceError::DuplicateSpecies(_) => EXIT_REJECTED,
        CatalogServiceError::Repo(repo) if is_input_error(repo) => EXIT_REJECTED,
        CatalogServiceError::Repo(_) => EXIT_STORAGE,
    }
}

fn is_input_error(err: &RepoError) -> bool {
    matches!(
        err,
        RepoError::InvalidSpecies(_) | RepoError::Validation(_) | RepoError::Constraint(_)
    )
}

fn run(
    service: &CatalogService<SqliteSpeciesRepository<'_>, SqliteFishRepository<'_>>,
    command: Command,
    json: bool,
) -> Result<ExitCode, CatalogServiceError> {
    match command {
        Command::Species { command } => match command {
            SpeciesCommand::List => {
                let species = service.species_index()?;
                print_result(json, &species, || {
                    species
                        .iter()
                        .map(|item| format!("{}\t{}", item.id, item.name))
                        .collect::<Vec<_>>()
                        .join("\n")
                });
                Ok(ExitCode::SUCCESS)
            }
            SpeciesCommand::Show { id } => match service.species_page(&id)? {
                Some(page) => {
                    print_result(json, &page, || {
                        let mut lines = vec![format!("{} ({})", page.name, page.id)];
                        lines.extend(page.fishes.iter().map(|fish| {
                            format!(
                                "  #{} {} - {} [{}]",
                                fish.id, fish.name, fish.description, fish.habitat
                            )
                        }));
                        lines.join("\n")
                    });
                    Ok(ExitCode::SUCCESS)
                }
                None => Ok(not_found(json, &format!("species not found: {id}"))),
            },
            SpeciesCommand::Add { id, name } => {
                let species = service.add_species(&id, &name)?;
                print_result(json, &species, || {
                    format!("added species {} ({})", species.id, species.name)
                });
                Ok(ExitCode::SUCCESS)
            }
        },
        Command::Fish { command } => match command {
            FishCommand::Add { species, fields } => {
                match service.submit_new_fish(&species, fields.into_payload())? {
                    NewFishOutcome::Created(fish) => {
                        print_result(json, &fish, || {
                            format!("added fish #{} {} to {}", fish.id, fish.name, species)
                        });
                        Ok(ExitCode::SUCCESS)
                    }
                    NewFishOutcome::SpeciesNotFound => {
                        Ok(not_found(json, &format!("species not found: {species}")))
                    }
                    NewFishOutcome::Rejected(rejected) => Ok(rejected_input(json, &rejected)),
                }
            }
            FishCommand::Show { species, fish_id } => {
                match service.edit_fish_form(&species, fish_id)? {
                    Some(form) => {
                        print_result(json, &form.fish, || {
                            format!(
                                "#{} {} ({})\ndescription: {}\nhabitat: {}",
                                form.fish.id,
                                form.fish.name,
                                form.species.name,
                                form.fish.description,
                                form.fish.habitat
                            )
                        });
                        Ok(ExitCode::SUCCESS)
                    }
                    None => Ok(not_found(
                        json,
                        &format!("fish #{fish_id} not found in species {species}"),
                    )),
                }
            }
            FishCommand::Edit {
                species,
                fish_id,
                fields,
            } => {
                let outcome = service.submit_fish_edit(&species, fish_id, fields.into_payload())?;
                Ok(report_change(json, &species, fish_id, "updated", outcome))
            }
            FishCommand::Delete { species, fish_id } => {
                let outcome = service.delete_fish(&species, fish_id)?;
                Ok(report_change(json, &species, fish_id, "deleted", outcome))
            }
            FishCommand::Validate { payload } => Ok(validate_payload(&payload, json)),
        },
    }
}

fn validate_payload(raw: &str, json: bool) -> ExitCode {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("fishy: payload is not valid JSON: {err}");
            return ExitCode::from(EXIT_REJECTED);
        }
    };

    let errors = validate_fish_data(&FishPayload::from_json(&value));
    print_result(json, &json!({ "valid": errors.is_empty(), "errors": errors }), || {
        if errors.is_empty() {
            "payload is valid".to_string()
        } else {
            errors.join("\n")
        }
    });

    if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_REJECTED)
    }
}

fn report_change(
    json: bool,
    species: &str,
    fish_id: FishId,
    verb: &str,
    outcome: FishChangeOutcome,
) -> ExitCode {
    match outcome {
        FishChangeOutcome::Applied(rows) => {
            print_result(json, &json!({ "fish_id": fish_id, "rows": rows }), || {
                format!("{verb} fish #{fish_id} ({rows} row(s))")
            });
            ExitCode::SUCCESS
        }
        FishChangeOutcome::SpeciesNotFound => {
            not_found(json, &format!("species not found: {species}"))
        }
        FishChangeOutcome::FishNotFound => not_found(
            json,
            &format!("fish #{fish_id} not found in species {species}"),
        ),
        FishChangeOutcome::Rejected(rejected) => rejected_input(json, &rejected),
    }
}

fn not_found(json: bool, message: &str) -> ExitCode {
    if json {
        println!("{}", json!({ "error": "not_found", "message": message }));
    } else {
        eprintln!("fishy: {message}");
    }
    ExitCode::from(EXIT_REJECTED)
}

fn rejected_input(json: bool, rejected: &RejectedFish) -> ExitCode {
    if json {
        println!(
            "{}",
            json!({ "error": "invalid_input", "errors": rejected.errors })
        );
    } else {
        for message in &rejected.errors {
            eprintln!("fishy: {message}");
        }
    }
    ExitCode::from(EXIT_REJECTED)
}

fn print_result<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => eprintln!("fishy: cannot render JSON: {err}"),
        }
    } else {
        println!("{}", text());
    }
}

#[cfg(test)]
mod tests {
    use super::{exit_status, resolve_config, Cli, EXIT_REJECTED, EXIT_STORAGE};
    use clap::Parser;
    use fishy_core::{
        CatalogConfig, CatalogServiceError, ConstraintViolation, DbError, FishData, RepoError,
        SpeciesValidationError,
    };
    use std::path::PathBuf;

    fn env_config() -> CatalogConfig {
        CatalogConfig::from_lookup(|key| match key {
            "FISHY_DB_PATH" => Some("/var/lib/fishy/env.sqlite".to_string()),
            "FISHY_LOG_LEVEL" => Some("warn".to_string()),
            "FISHY_LOG_DIR" => Some("/var/log/fishy-env".to_string()),
            _ => None,
        })
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::try_parse_from([
            "fishy",
            "--db",
            "/tmp/flag.sqlite",
            "--log-level",
            "debug",
            "--log-dir",
            "/tmp/fishy-logs",
            "species",
            "list",
        ])
        .unwrap();

        let config = resolve_config(&cli, env_config());
        assert_eq!(config.db_path, PathBuf::from("/tmp/flag.sqlite"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/fishy-logs")));
    }

    #[test]
    fn environment_applies_when_flags_are_absent() {
        let cli = Cli::try_parse_from(["fishy", "species", "list"]).unwrap();

        let config = resolve_config(&cli, env_config());
        assert_eq!(config.db_path, PathBuf::from("/var/lib/fishy/env.sqlite"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/fishy-env")));
    }

    #[test]
    fn rejected_input_exits_with_one() {
        let invalid_fish = FishData::new("", "Large", "Pacific").validate().unwrap_err();
        let errors = [
            CatalogServiceError::DuplicateSpecies("salmon".to_string()),
            CatalogServiceError::Repo(RepoError::InvalidSpecies(
                SpeciesValidationError::InvalidId("sea bass".to_string()),
            )),
            CatalogServiceError::Repo(RepoError::Validation(invalid_fish)),
            CatalogServiceError::Repo(RepoError::Constraint(
                ConstraintViolation::UnknownSpecies("pike".to_string()),
            )),
        ];
        for err in &errors {
            assert_eq!(exit_status(err), EXIT_REJECTED, "{err}");
        }
    }

    #[test]
    fn storage_failures_exit_with_two() {
        let newer_schema = CatalogServiceError::Repo(RepoError::Db(
            DbError::UnsupportedSchemaVersion {
                db_version: 9,
                latest_supported: 1,
            },
        ));
        assert_eq!(exit_status(&newer_schema), EXIT_STORAGE);

        let uninitialized = CatalogServiceError::Repo(RepoError::UninitializedConnection {
            expected_version: 1,
            actual_version: 0,
        });
        assert_eq!(exit_status(&uninitialized), EXIT_STORAGE);
    }
}
